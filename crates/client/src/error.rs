//! Unified error handling for the client SDK.
//!
//! Remote failures fall into the four buckets the stores care about:
//! transport, 401-unauthorized, validation (other 4xx), and unexpected.
//! A 401 is special: by the time the caller sees [`ApiError::Unauthorized`],
//! the transport has already torn the session down.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur when talking to the shop API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response was produced.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server rejected the bearer token. Session has been cleared.
    #[error("Unauthorized: session cleared")]
    Unauthorized,

    /// The server rejected the request payload (4xx other than 401).
    #[error("Validation error ({status}): {body}")]
    Validation {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },

    /// JSON parsing of a response body failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Durable local storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Any other non-success response (5xx, unexpected shapes).
    #[error("Unexpected response ({status}): {body}")]
    Unexpected {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },
}

impl ApiError {
    /// Whether this error is the transport-level 401 teardown signal.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Result type alias for [`ApiError`].
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Validation {
            status: 400,
            body: "quantity must be positive".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Validation error (400): quantity must be positive"
        );

        assert!(ApiError::Unauthorized.is_unauthorized());
        assert!(!err.is_unauthorized());
    }
}
