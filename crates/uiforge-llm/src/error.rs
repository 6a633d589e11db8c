//! Error types for the generation proxy.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using the generation error type.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Error type for generation calls.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Provider returned a non-success status.
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// Provider throttled the request.
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// The request did not complete within the client timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Network/connectivity error.
    #[error("Network error: {0}")]
    Network(String),

    /// Provider answered but produced no text.
    #[error("Empty response from provider")]
    EmptyResponse,

    /// Configuration error (API key missing, etc.).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl LlmError {
    /// Whether the provider could not be reached or did not answer in time.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Network(_))
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::Serialization(err.to_string())
    }
}
