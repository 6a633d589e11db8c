//! Fast cache abstraction and the in-process LRU implementation.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::error::Result;
use crate::ttl::TtlTracker;

/// Key-value store with per-key expiration, used in front of the durable store.
///
/// Values are opaque strings (the session manager stores JSON). Every method
/// may fail with [`Error::Cache`](crate::Error::Cache); implementations do not
/// retry.
#[async_trait]
pub trait FastCache: Send + Sync {
    /// Read one key.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Read several keys; the result is positionally aligned with `keys`.
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.get(key).await?);
        }
        Ok(values)
    }

    /// Write one key with an expiration.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Delete one key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// All live keys starting with the literal `prefix`.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    /// Backend name, for logs.
    fn name(&self) -> &str;
}

/// Inner state protected by RwLock.
struct CacheInner {
    /// LRU of serialized values.
    lru: LruCache<String, String>,

    /// Expiry deadlines.
    ttl: TtlTracker,
}

/// In-process cache with LRU eviction and per-key TTL.
///
/// Expired entries are invisible to reads and scans. They are dropped when
/// touched, by [`cleanup_expired`](Self::cleanup_expired), or by the
/// background task started with [`start_cleanup_task`](Self::start_cleanup_task).
#[derive(Clone)]
pub struct MemoryCache {
    inner: Arc<RwLock<CacheInner>>,
    config: CacheConfig,
}

impl MemoryCache {
    /// Create a new cache.
    pub fn new(config: CacheConfig) -> Self {
        let cap = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);

        let inner = CacheInner {
            lru: LruCache::new(cap),
            ttl: TtlTracker::new(),
        };

        Self {
            inner: Arc::new(RwLock::new(inner)),
            config,
        }
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get the current number of entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.inner.read().await.lru.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.lru.is_empty()
    }

    /// Time left before `key` expires, if it is cached.
    pub async fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        let inner = self.inner.read().await;
        if inner.ttl.is_expired(key) {
            None
        } else {
            inner.ttl.remaining(key)
        }
    }

    /// Drop expired entries and return how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut inner = self.inner.write().await;
        let expired = inner.ttl.drain_expired();
        let count = expired.len();

        for key in expired {
            inner.lru.pop(&key);
        }

        if count > 0 {
            debug!(count = count, "Cleaned up expired cache entries");
        }

        count
    }

    /// Spawn the periodic sweep if enabled in the configuration.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_cleanup_task(&self) -> Option<JoinHandle<()>> {
        if !self.config.enable_cleanup_task {
            return None;
        }

        let cache = self.clone();
        let interval = self.config.cleanup_interval;
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                cache.cleanup_expired().await;
            }
        }))
    }

    /// Get cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.read().await;
        CacheStats {
            size: inner.lru.len(),
            capacity: self.config.max_entries,
            ttl_tracked: inner.ttl.len(),
        }
    }
}

#[async_trait]
impl FastCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut inner = self.inner.write().await;

        if inner.ttl.is_expired(key) {
            if inner.lru.pop(key).is_some() {
                debug!(key = %key, "Cache entry expired, removing");
            }
            inner.ttl.remove(key);
            return Ok(None);
        }

        let value = inner.lru.get(key).cloned();
        trace!(key = %key, hit = value.is_some(), "Cache lookup");
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut inner = self.inner.write().await;

        if let Some((evicted, _)) = inner.lru.push(key.to_string(), value)
            && evicted != key
        {
            debug!(key = %evicted, "Evicting LRU cache entry to make room");
            inner.ttl.remove(&evicted);
        }
        inner.ttl.set(key, ttl);

        trace!(
            key = %key,
            ttl_secs = ttl.as_secs(),
            cache_size = inner.lru.len(),
            "Cache entry written"
        );

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.ttl.remove(key);
        inner.lru.pop(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner
            .lru
            .iter()
            .filter(|(key, _)| key.starts_with(prefix) && !inner.ttl.is_expired(key))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Current number of entries.
    pub size: usize,

    /// Maximum capacity.
    pub capacity: usize,

    /// Number of keys with a tracked deadline.
    pub ttl_tracked: usize,
}
