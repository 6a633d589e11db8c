//! Storage backends for uiforge sessions.
//!
//! - [`SqliteStore`]: the durable store, one row per persisted session
//! - [`RedisCache`]: the shared fast cache for multi-instance deployments

mod error;
mod redis_cache;
mod sqlite;

pub use error::{Result, StoreError};
pub use redis_cache::{DEFAULT_REDIS_TIMEOUT, RedisCache};
pub use sqlite::SqliteStore;
