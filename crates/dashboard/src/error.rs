//! Error types for Dashboard API operations.
//!
//! Errors are categorized so callers can tell throttling apart from
//! authentication problems or malformed responses, and report them with
//! appropriate advice.

use std::fmt;

/// Result type alias for Dashboard API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of Dashboard API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connection failures and server-side (5xx) errors.
    Network,
    /// The API kept answering 429 after the retry budget was spent.
    RateLimited,
    /// The API key was rejected (401/403).
    Auth,
    /// The requested organization, network or endpoint does not exist.
    NotFound,
    /// The response body could not be decoded.
    Format,
    /// Caller errors and anything else.
    Other,
}

impl ErrorCategory {
    /// Category of a failed HTTP status.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            401 | 403 => Self::Auth,
            404 => Self::NotFound,
            code if code < 500 => Self::Other,
            _ => Self::Network,
        }
    }

    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::RateLimited)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::RateLimited => "Rate limit exceeded",
            Self::Auth => "Authentication failed",
            Self::NotFound => "Resource not found",
            Self::Format => "Invalid API response",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check your internet connection and try again",
            Self::RateLimited => "Wait a minute or raise --max-retries, then run again",
            Self::Auth => "Verify MERAKI_DASHBOARD_API_KEY and its organization access",
            Self::NotFound => "Verify the organization and network names are correct",
            Self::Format => "The Dashboard API returned unexpected data, try again",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the Dashboard API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed or returned an error status.
    #[error("HTTP request failed: {message}")]
    HttpError {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// Invalid response from API.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// A tag mutation was asked to carry more devices than one call allows.
    #[error("tag batch of {size} devices exceeds the limit of {max}")]
    BatchTooLarge {
        /// Number of device ids in the rejected batch.
        size: usize,
        /// Largest batch the endpoint accepts.
        max: usize,
    },

    /// A tag mutation was asked to carry no tags.
    #[error("tag mutation requires at least one tag")]
    NoTags,
}

impl Error {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::HttpError {
            message: message.into(),
            status,
        }
    }

    /// HTTP status code carried by this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpError { status, .. } => *status,
            _ => None,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::HttpError { status, .. } => {
                status.map_or(ErrorCategory::Network, ErrorCategory::from_status)
            }
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::BatchTooLarge { .. } | Error::NoTags => ErrorCategory::Other,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::HttpError {
                message: format!("HTTP {}", code),
                status: Some(code),
            },
            ureq::Error::Json(err) => Self::InvalidResponse(err.to_string()),
            other => Self::HttpError {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
