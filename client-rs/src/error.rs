//! Error types for authorization fetches
//!
//! These never reach store consumers: the store logs them and falls back
//! to an empty permission set. They are public so custom sources can
//! report failures the same way [`HttpSource`](crate::HttpSource) does.

use thiserror::Error;

/// Errors that can occur while fetching authorization state
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request could not be sent or the response could not be read
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// The server answered with a non-2xx status
    #[error("Unexpected status: {0}")]
    Status(u16),

    /// The response body was not JSON
    #[error("Malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The configured endpoint is not a valid URL
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Whether the server explicitly rejected the session (401/403)
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, FetchError::Status(401) | FetchError::Status(403))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else if err.is_builder() {
            FetchError::InvalidUrl(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Result type for authorization fetches
pub type Result<T> = std::result::Result<T, FetchError>;
