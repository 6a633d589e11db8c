//! Configuration for the session manager and the in-process cache.

use std::time::Duration;

/// Default cache lifetime for draft sessions (no messages yet).
pub const DEFAULT_DRAFT_TTL: Duration = Duration::from_secs(60 * 60);

/// Default cache lifetime for persisted sessions.
pub const DEFAULT_PERSISTED_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default prefix for every cache key written by the session manager.
pub const DEFAULT_KEY_PREFIX: &str = "uiforge";

/// Default maximum number of entries held by [`MemoryCache`](crate::MemoryCache).
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Lifecycle policy applied by the [`SessionManager`](crate::SessionManager).
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    /// Cache TTL for drafts.
    pub draft_ttl: Duration,

    /// Cache TTL for persisted sessions.
    pub persisted_ttl: Duration,

    /// Prefix for cache keys.
    pub key_prefix: String,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            draft_ttl: DEFAULT_DRAFT_TTL,
            persisted_ttl: DEFAULT_PERSISTED_TTL,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl SessionPolicy {
    /// Create a policy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the draft TTL.
    pub fn with_draft_ttl(mut self, ttl: Duration) -> Self {
        self.draft_ttl = ttl;
        self
    }

    /// Set the persisted TTL.
    pub fn with_persisted_ttl(mut self, ttl: Duration) -> Self {
        self.persisted_ttl = ttl;
        self
    }

    /// Set the cache key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// TTL for a record in the given state.
    pub fn ttl_for(&self, is_temporary: bool) -> Duration {
        if is_temporary {
            self.draft_ttl
        } else {
            self.persisted_ttl
        }
    }
}

/// Configuration for the in-process cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries before LRU eviction.
    pub max_entries: usize,

    /// Whether to run periodic cleanup of expired entries.
    /// If false, expired entries are only dropped on access.
    pub enable_cleanup_task: bool,

    /// Interval for the cleanup task (if enabled).
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            enable_cleanup_task: true,
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl CacheConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Enable or disable the background cleanup task.
    pub fn with_cleanup_task(mut self, enabled: bool) -> Self {
        self.enable_cleanup_task = enabled;
        self
    }

    /// Set the cleanup interval.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_for_state() {
        let policy = SessionPolicy::new()
            .with_draft_ttl(Duration::from_secs(5))
            .with_persisted_ttl(Duration::from_secs(50));

        assert_eq!(policy.ttl_for(true), Duration::from_secs(5));
        assert_eq!(policy.ttl_for(false), Duration::from_secs(50));
    }

    #[test]
    fn test_defaults_keep_drafts_shorter() {
        let policy = SessionPolicy::default();
        assert!(policy.draft_ttl < policy.persisted_ttl);
        assert_eq!(policy.key_prefix, DEFAULT_KEY_PREFIX);
    }
}
