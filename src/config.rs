use crate::error::AutotagError;
use std::fmt;

/// Environment variable holding the Dashboard API key
pub const API_KEY_VAR: &str = "MERAKI_DASHBOARD_API_KEY";

/// Optional override for the Dashboard API base URL
pub const API_BASE_VAR: &str = "MERAKI_DASHBOARD_API_BASE_URL";

/// Settings read from the environment
#[derive(Clone)]
pub struct Settings {
    pub api_key: String,
    pub api_base: Option<String>,
}

impl Settings {
    /// Load settings from `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, AutotagError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AutotagError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(AutotagError::MissingApiKey { var: API_KEY_VAR })?;

        let api_base = lookup(API_BASE_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(Self { api_key, api_base })
    }
}

// Keep the key out of logs
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn reads_api_key() {
        let settings = Settings::from_lookup(lookup(&[(API_KEY_VAR, "abc123")])).unwrap();
        assert_eq!(settings.api_key, "abc123");
        assert!(settings.api_base.is_none());
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let err = Settings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, AutotagError::MissingApiKey { var } if var == API_KEY_VAR));
    }

    #[test]
    fn blank_api_key_is_missing() {
        assert!(Settings::from_lookup(lookup(&[(API_KEY_VAR, "  ")])).is_err());
    }

    #[test]
    fn reads_api_base_override() {
        let settings = Settings::from_lookup(lookup(&[
            (API_KEY_VAR, "abc123"),
            (API_BASE_VAR, "https://api.meraki.ca/api/v1"),
        ]))
        .unwrap();
        assert_eq!(
            settings.api_base.as_deref(),
            Some("https://api.meraki.ca/api/v1")
        );
    }

    #[test]
    fn debug_redacts_api_key() {
        let settings = Settings::from_lookup(lookup(&[(API_KEY_VAR, "abc123")])).unwrap();
        let debug = format!("{settings:?}");
        assert!(!debug.contains("abc123"));
        assert!(debug.contains("redacted"));
    }
}
