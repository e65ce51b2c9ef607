//! Backend trait and implementations for the Dashboard API.
//!
//! [`Backend`] is the seam between the tagging engine and the remote
//! service. [`meraki::MerakiBackend`] talks HTTP; [`MockBackend`] keeps
//! everything in memory.
//!
//! # Testing
//!
//! Use [`MockBackend`] for testing without network access:
//!
//! ```
//! use dashboard::backend::{Backend, MockBackend};
//! use dashboard::{DeviceSnapshot, TagAction};
//!
//! let mock = MockBackend::new();
//! mock.add_device("N_1", DeviceSnapshot::new("D1").imei("123"));
//!
//! mock.modify_device_tags("N_1", &["D1".to_string()], &["Store_Ipad".to_string()], TagAction::Add)
//!     .unwrap();
//!
//! assert_eq!(mock.tag_calls().len(), 1);
//! ```

pub mod meraki;

use crate::error::{Error, Result};
use crate::types::{DeviceSnapshot, MAX_TAG_BATCH, Network, Organization, ProductType, TagAction};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// The remote operations the tagging engine relies on.
///
/// Every list call returns the complete, fully paginated result; callers
/// never see partial pages.
pub trait Backend: Send + Sync {
    /// List all organizations the API key can access.
    fn list_organizations(&self) -> Result<Vec<Organization>>;

    /// List the networks of an organization that have `product` enabled.
    fn list_networks(&self, org_id: &str, product: ProductType) -> Result<Vec<Network>>;

    /// List the Systems Manager devices of a network.
    ///
    /// `fields` names the extra device attributes to include.
    fn list_managed_devices(&self, network_id: &str, fields: &[&str])
    -> Result<Vec<DeviceSnapshot>>;

    /// Add or remove `tags` on up to [`MAX_TAG_BATCH`] devices in one call.
    fn modify_device_tags(
        &self,
        network_id: &str,
        ids: &[String],
        tags: &[String],
        action: TagAction,
    ) -> Result<()>;
}

/// Check the shape of a tag mutation before it is sent.
pub(crate) fn validate_tag_batch(ids: &[String], tags: &[String]) -> Result<()> {
    if ids.len() > MAX_TAG_BATCH {
        return Err(Error::BatchTooLarge {
            size: ids.len(),
            max: MAX_TAG_BATCH,
        });
    }
    if tags.is_empty() {
        return Err(Error::NoTags);
    }
    Ok(())
}

/// One recorded `modify_device_tags` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCall {
    /// Network the call targeted.
    pub network_id: String,
    /// Device ids in the batch, in submission order.
    pub ids: Vec<String>,
    /// Tags carried by the call.
    pub tags: Vec<String>,
    /// Add or remove.
    pub action: TagAction,
}

#[derive(Debug, Default)]
struct MockState {
    organizations: Vec<Organization>,
    networks: HashMap<String, Vec<Network>>,
    devices: HashMap<String, Vec<DeviceSnapshot>>,
    tag_calls: Vec<TagCall>,
    fail_tag_call: Option<usize>,
}

/// Mock backend for testing without network access.
///
/// Tag mutations are recorded and also applied to the stored devices, so
/// a second reconciliation pass sees the result of the first.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Add an organization.
    pub fn add_organization(&self, id: impl Into<String>, name: impl Into<String>) {
        self.state().organizations.push(Organization {
            id: id.into(),
            name: name.into(),
        });
    }

    /// Add a network to an organization.
    pub fn add_network(
        &self,
        org_id: impl Into<String>,
        id: impl Into<String>,
        name: impl Into<String>,
        products: &[ProductType],
    ) {
        self.state()
            .networks
            .entry(org_id.into())
            .or_default()
            .push(Network {
                id: id.into(),
                name: name.into(),
                product_types: products.iter().map(|p| p.as_str().to_string()).collect(),
            });
    }

    /// Add a managed device to a network.
    pub fn add_device(&self, network_id: impl Into<String>, device: DeviceSnapshot) {
        self.state()
            .devices
            .entry(network_id.into())
            .or_default()
            .push(device);
    }

    /// Make the `index`-th (zero-based) tag call fail with a 500.
    pub fn fail_tag_call(&self, index: usize) {
        self.state().fail_tag_call = Some(index);
    }

    /// All tag calls made so far, including the one that failed.
    #[must_use]
    pub fn tag_calls(&self) -> Vec<TagCall> {
        self.state().tag_calls.clone()
    }

    /// Current devices of a network.
    #[must_use]
    pub fn devices(&self, network_id: &str) -> Vec<DeviceSnapshot> {
        self.state()
            .devices
            .get(network_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl Backend for MockBackend {
    fn list_organizations(&self) -> Result<Vec<Organization>> {
        Ok(self.state().organizations.clone())
    }

    fn list_networks(&self, org_id: &str, product: ProductType) -> Result<Vec<Network>> {
        let state = self.state();
        let networks: Vec<Network> = state
            .networks
            .get(org_id)
            .map(|networks| {
                networks
                    .iter()
                    .filter(|n| n.has_product(product))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(networks)
    }

    fn list_managed_devices(
        &self,
        network_id: &str,
        _fields: &[&str],
    ) -> Result<Vec<DeviceSnapshot>> {
        Ok(self.devices(network_id))
    }

    fn modify_device_tags(
        &self,
        network_id: &str,
        ids: &[String],
        tags: &[String],
        action: TagAction,
    ) -> Result<()> {
        validate_tag_batch(ids, tags)?;

        let mut state = self.state();
        let index = state.tag_calls.len();
        state.tag_calls.push(TagCall {
            network_id: network_id.to_string(),
            ids: ids.to_vec(),
            tags: tags.to_vec(),
            action,
        });

        if state.fail_tag_call == Some(index) {
            return Err(Error::http("HTTP 500", Some(500)));
        }

        if let Some(devices) = state.devices.get_mut(network_id) {
            for device in devices
                .iter_mut()
                .filter(|d| d.id.as_ref().is_some_and(|id| ids.contains(id)))
            {
                for tag in tags {
                    match action {
                        TagAction::Add => {
                            device.tags.insert(tag.clone());
                        }
                        TagAction::Remove => {
                            device.tags.remove(tag);
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_mock_backend_new() {
        let mock = MockBackend::new();
        assert!(mock.list_organizations().unwrap().is_empty());
        assert!(mock.tag_calls().is_empty());
    }

    #[test]
    fn test_mock_backend_filters_networks_by_product() {
        let mock = MockBackend::new();
        mock.add_network("O_1", "N_1", "Stores", &[ProductType::SystemsManager]);
        mock.add_network("O_1", "N_2", "Office", &[ProductType::Wireless]);

        let networks = mock.list_networks("O_1", ProductType::SystemsManager).unwrap();
        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0].id, "N_1");

        assert!(
            mock.list_networks("O_2", ProductType::SystemsManager)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_mock_backend_applies_tag_changes() {
        let mock = MockBackend::new();
        mock.add_device("N_1", DeviceSnapshot::new("D1").tags(["Curbside_iPad"]));
        mock.add_device("N_1", DeviceSnapshot::new("D2"));

        mock.modify_device_tags("N_1", &ids(&["D1"]), &ids(&["Store_Ipad"]), TagAction::Add)
            .unwrap();
        mock.modify_device_tags(
            "N_1",
            &ids(&["D1"]),
            &ids(&["Curbside_iPad"]),
            TagAction::Remove,
        )
        .unwrap();

        let devices = mock.devices("N_1");
        assert!(devices[0].has_tag("Store_Ipad"));
        assert!(!devices[0].has_tag("Curbside_iPad"));
        assert!(devices[1].tags.is_empty());
        assert_eq!(mock.tag_calls().len(), 2);
    }

    #[test]
    fn test_mock_backend_rejects_oversized_batch() {
        let mock = MockBackend::new();
        let batch: Vec<String> = (0..=MAX_TAG_BATCH).map(|i| format!("D{i}")).collect();

        let result = mock.modify_device_tags("N_1", &batch, &ids(&["Store_Ipad"]), TagAction::Add);
        assert!(matches!(result, Err(Error::BatchTooLarge { size: 21, max: 20 })));
        assert!(mock.tag_calls().is_empty());
    }

    #[test]
    fn test_mock_backend_rejects_empty_tags() {
        let mock = MockBackend::new();
        let result = mock.modify_device_tags("N_1", &ids(&["D1"]), &[], TagAction::Add);
        assert!(matches!(result, Err(Error::NoTags)));
    }

    #[test]
    fn test_mock_backend_injected_failure() {
        let mock = MockBackend::new();
        mock.fail_tag_call(1);

        let tags = ids(&["Store_Ipad"]);
        assert!(mock.modify_device_tags("N_1", &ids(&["D1"]), &tags, TagAction::Add).is_ok());
        let err = mock
            .modify_device_tags("N_1", &ids(&["D2"]), &tags, TagAction::Add)
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(mock.tag_calls().len(), 2);
    }
}
