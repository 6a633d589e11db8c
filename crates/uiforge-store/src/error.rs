use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Redis call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Blocking task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Whether this error came from the cache backend.
    pub fn is_cache(&self) -> bool {
        matches!(self, StoreError::Redis(_) | StoreError::Timeout(_))
    }
}

impl From<StoreError> for uiforge_session::Error {
    fn from(e: StoreError) -> Self {
        if e.is_cache() {
            uiforge_session::Error::Cache(e.to_string())
        } else {
            uiforge_session::Error::Store(e.to_string())
        }
    }
}
