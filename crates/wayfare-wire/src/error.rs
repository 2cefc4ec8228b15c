//! Error types for wayfare-wire

use thiserror::Error;

/// Result type alias using wayfare-wire Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur talking to the travel agent service
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Service answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Request rejected by the service's parameter validation (HTTP 422)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A single frame could not be decoded
    #[error("Frame decode error: {0}")]
    Decode(String),

    /// Unexpected response format
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a status error from a code and body text
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Whether retrying the same request later may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_body(),
            Error::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_status_codes() {
        assert!(Error::status(503, "unavailable").is_retryable());
        assert!(Error::status(429, "slow down").is_retryable());
        assert!(!Error::status(404, "not found").is_retryable());
        assert!(!Error::Validation("bad query".into()).is_retryable());
    }

    #[test]
    fn test_status_display() {
        let e = Error::status(502, "Bad Gateway");
        assert_eq!(e.to_string(), "HTTP 502: Bad Gateway");
    }
}
