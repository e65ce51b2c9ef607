//! Core types for the Dashboard API.
//!
//! These are the fixed-shape records the rest of the system works with.
//! Raw JSON is converted into them once, at the backend boundary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Largest number of device ids a single `modifyTags` call accepts.
pub const MAX_TAG_BATCH: usize = 20;

/// Device fields requested from the Systems Manager inventory.
///
/// `id` is always returned and does not need to be requested.
pub const DEVICE_FIELDS: &[&str] = &["imei", "iccid", "simCarrierNetwork", "phoneNumber", "tags"];

/// An organization visible to the API key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Stable organization identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// A network inside an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    /// Stable network identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Products enabled on the network (e.g. `systemsManager`).
    #[serde(default)]
    pub product_types: Vec<String>,
}

impl Network {
    /// Whether the network has the given product enabled.
    #[must_use]
    pub fn has_product(&self, product: ProductType) -> bool {
        self.product_types.iter().any(|p| p == product.as_str())
    }
}

/// Dashboard product types used to filter networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductType {
    /// MX security appliances.
    Appliance,
    /// MV cameras.
    Camera,
    /// MG cellular gateways.
    CellularGateway,
    /// MT sensors.
    Sensor,
    /// MS switches.
    Switch,
    /// Systems Manager (mobile device management).
    SystemsManager,
    /// MR wireless access points.
    Wireless,
}

impl ProductType {
    /// The identifier the API uses for this product.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Appliance => "appliance",
            Self::Camera => "camera",
            Self::CellularGateway => "cellularGateway",
            Self::Sensor => "sensor",
            Self::Switch => "switch",
            Self::SystemsManager => "systemsManager",
            Self::Wireless => "wireless",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a tag mutation changes the device's tag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagAction {
    /// Add the tags, keeping existing ones.
    #[serde(rename = "add")]
    Add,
    /// Remove the tags, keeping the rest.
    #[serde(rename = "delete")]
    Remove,
}

impl TagAction {
    /// The `updateAction` value the API expects.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "delete",
        }
    }
}

impl fmt::Display for TagAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read-only view of one managed device at fetch time.
///
/// Evidence fields are `None` when the inventory reported null or an
/// empty string. `id` is optional because the inventory is not trusted to
/// always return one; consumers skip devices without it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    /// Opaque device identifier used as the mutation key.
    pub id: Option<String>,
    /// Modem IMEI.
    pub imei: Option<String>,
    /// SIM card ICCID.
    pub iccid: Option<String>,
    /// Carrier network the SIM is attached to.
    pub sim_carrier_network: Option<String>,
    /// Phone number assigned to the SIM.
    pub phone_number: Option<String>,
    /// Current tags.
    pub tags: BTreeSet<String>,
}

impl DeviceSnapshot {
    /// Create a snapshot with an identifier and no evidence or tags.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: non_empty(Some(id.into())),
            ..Self::default()
        }
    }

    /// Set the IMEI.
    pub fn imei(mut self, imei: impl Into<String>) -> Self {
        self.imei = non_empty(Some(imei.into()));
        self
    }

    /// Set the ICCID.
    pub fn iccid(mut self, iccid: impl Into<String>) -> Self {
        self.iccid = non_empty(Some(iccid.into()));
        self
    }

    /// Set the carrier network.
    pub fn sim_carrier_network(mut self, carrier: impl Into<String>) -> Self {
        self.sim_carrier_network = non_empty(Some(carrier.into()));
        self
    }

    /// Set the phone number.
    pub fn phone_number(mut self, number: impl Into<String>) -> Self {
        self.phone_number = non_empty(Some(number.into()));
        self
    }

    /// Replace the tag set.
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the device currently carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// The four cellular evidence fields, in a fixed order.
    #[must_use]
    pub fn cellular_evidence(&self) -> [Option<&str>; 4] {
        [
            self.imei.as_deref(),
            self.iccid.as_deref(),
            self.sim_carrier_network.as_deref(),
            self.phone_number.as_deref(),
        ]
    }
}

/// Collapse empty strings to `None`.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_type_as_str() {
        assert_eq!(ProductType::SystemsManager.as_str(), "systemsManager");
        assert_eq!(ProductType::CellularGateway.to_string(), "cellularGateway");
    }

    #[test]
    fn test_tag_action_wire_names() {
        assert_eq!(TagAction::Add.as_str(), "add");
        assert_eq!(TagAction::Remove.as_str(), "delete");
        assert_eq!(
            serde_json::to_string(&TagAction::Remove).unwrap(),
            "\"delete\""
        );
    }

    #[test]
    fn test_network_has_product() {
        let network: Network = serde_json::from_value(serde_json::json!({
            "id": "N_1",
            "name": "Stores",
            "productTypes": ["systemsManager", "wireless"]
        }))
        .unwrap();

        assert!(network.has_product(ProductType::SystemsManager));
        assert!(!network.has_product(ProductType::Switch));
    }

    #[test]
    fn test_network_without_product_types() {
        let network: Network =
            serde_json::from_value(serde_json::json!({"id": "N_1", "name": "Stores"})).unwrap();
        assert!(network.product_types.is_empty());
    }

    #[test]
    fn test_snapshot_builder() {
        let device = DeviceSnapshot::new("D1")
            .imei("123")
            .tags(["Store_Ipad", "Store_Ipad", "Lobby"]);

        assert_eq!(device.id.as_deref(), Some("D1"));
        assert_eq!(device.tags.len(), 2);
        assert!(device.has_tag("Lobby"));
        assert_eq!(device.cellular_evidence(), [Some("123"), None, None, None]);
    }

    #[test]
    fn test_snapshot_builder_drops_empty_values() {
        let device = DeviceSnapshot::new("").phone_number("");
        assert!(device.id.is_none());
        assert!(device.phone_number.is_none());
    }
}
