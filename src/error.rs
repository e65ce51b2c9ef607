//! Errors that end a tagging run

use thiserror::Error;

/// Errors that end a tagging run
#[derive(Error, Debug)]
pub enum AutotagError {
    /// The API key is not configured
    #[error("{var} is not set; add it to a .env file or export it")]
    MissingApiKey { var: &'static str },

    /// The tag policy cannot be applied safely
    #[error("invalid tag policy: {0}")]
    InvalidPolicy(String),

    /// No organization matches the name
    #[error("organization '{0}' not found")]
    OrganizationNotFound(String),

    /// No Systems Manager network matches the name in the organization
    #[error("network '{network}' not found in organization '{organization}'")]
    NetworkNotFound {
        network: String,
        organization: String,
    },

    /// A Dashboard API call failed
    #[error("Dashboard API call failed: {0}")]
    Remote(#[from] dashboard::Error),
}

impl AutotagError {
    /// Hint printed after the error, if there is a useful one
    pub fn advice(&self) -> Option<&'static str> {
        match self {
            Self::MissingApiKey { .. } => None,
            Self::InvalidPolicy(_) => Some("Pass distinct, unpadded values to --cellular-tag and --wifi-tag"),
            Self::OrganizationNotFound(_) | Self::NetworkNotFound { .. } => {
                Some("Names are matched exactly, ignoring case")
            }
            Self::Remote(err) => Some(err.category().advice()),
        }
    }
}
