//! Error types for session operations.

/// Error type for session operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Session does not exist for the requesting owner.
    #[error("Session not found: {0}")]
    NotFound(String),

    /// The fast cache rejected or failed a call.
    #[error("Cache error: {0}")]
    Cache(String),

    /// The durable store rejected or failed a call.
    #[error("Store error: {0}")]
    Store(String),

    /// A session record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, Error>;
