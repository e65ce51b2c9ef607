//! Capability classification and tag policy

use crate::error::AutotagError;
use dashboard::DeviceSnapshot;
use std::fmt;

/// Default tag for devices with cellular hardware
pub const DEFAULT_CELLULAR_TAG: &str = "Store_Ipad";

/// Default tag for Wi-Fi-only devices
pub const DEFAULT_WIFI_TAG: &str = "Curbside_iPad";

/// Hardware capability inferred from a device's cellular identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Cellular,
    WifiOnly,
}

impl Capability {
    /// The other capability
    pub fn opposite(self) -> Self {
        match self {
            Self::Cellular => Self::WifiOnly,
            Self::WifiOnly => Self::Cellular,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cellular => "cellular-capable",
            Self::WifiOnly => "Wi-Fi only",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a device.
///
/// Any one of IMEI, ICCID, carrier network or phone number is enough to
/// count as cellular.
pub fn classify(device: &DeviceSnapshot) -> Capability {
    if device.cellular_evidence().iter().any(Option::is_some) {
        Capability::Cellular
    } else {
        Capability::WifiOnly
    }
}

/// Which tag each capability should carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPolicy {
    cellular: String,
    wifi: String,
}

impl TagPolicy {
    /// Build a policy, rejecting empty, padded or identical tags.
    ///
    /// Tags are compared verbatim against device tags. Identical tags would
    /// make pruning remove the tag a device should keep.
    pub fn new(cellular: impl Into<String>, wifi: impl Into<String>) -> Result<Self, AutotagError> {
        let cellular = cellular.into();
        let wifi = wifi.into();

        if cellular.is_empty() || wifi.is_empty() {
            return Err(AutotagError::InvalidPolicy(
                "tags must not be empty".to_string(),
            ));
        }
        if let Some(padded) = [&cellular, &wifi].into_iter().find(|t| t.trim() != t.as_str()) {
            return Err(AutotagError::InvalidPolicy(format!(
                "tag '{}' has leading or trailing whitespace",
                padded
            )));
        }
        if cellular == wifi {
            return Err(AutotagError::InvalidPolicy(format!(
                "cellular and Wi-Fi tags are both '{}'",
                cellular
            )));
        }

        Ok(Self { cellular, wifi })
    }

    pub fn tag_for(&self, capability: Capability) -> &str {
        match capability {
            Capability::Cellular => &self.cellular,
            Capability::WifiOnly => &self.wifi,
        }
    }
}

impl Default for TagPolicy {
    fn default() -> Self {
        Self {
            cellular: DEFAULT_CELLULAR_TAG.to_string(),
            wifi: DEFAULT_WIFI_TAG.to_string(),
        }
    }
}
