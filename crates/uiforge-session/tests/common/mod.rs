//! Shared fixtures for session lifecycle tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use uiforge_session::{
    CacheConfig, DurableStore, Error, FastCache, MemoryCache, MemoryStore, Result, Session,
    SessionId, SessionManager, SessionPolicy,
};

/// Cache wrapper whose reads and writes can be made to fail.
#[derive(Clone)]
pub struct FlakyCache {
    pub inner: MemoryCache,
    pub fail_reads: Arc<AtomicBool>,
    pub fail_writes: Arc<AtomicBool>,
}

impl FlakyCache {
    pub fn new() -> Self {
        Self {
            inner: MemoryCache::new(CacheConfig::new().with_cleanup_task(false)),
            fail_reads: Arc::new(AtomicBool::new(false)),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    fn check(flag: &AtomicBool) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            Err(Error::Cache("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl FastCache for FlakyCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Self::check(&self.fail_reads)?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        Self::check(&self.fail_writes)?;
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        Self::check(&self.fail_writes)?;
        self.inner.delete(key).await
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Self::check(&self.fail_reads)?;
        self.inner.keys_with_prefix(prefix).await
    }

    fn name(&self) -> &str {
        "flaky-memory"
    }
}

/// Store wrapper whose reads and writes can be made to fail.
#[derive(Clone)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_reads: Arc<AtomicBool>,
    pub fail_writes: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_reads: Arc::new(AtomicBool::new(false)),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    fn check(flag: &AtomicBool) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            Err(Error::Store("database is locked".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DurableStore for FlakyStore {
    async fn get(&self, owner_id: &str, id: &SessionId) -> Result<Option<Session>> {
        Self::check(&self.fail_reads)?;
        self.inner.get(owner_id, id).await
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Session>> {
        Self::check(&self.fail_reads)?;
        self.inner.list_by_owner(owner_id).await
    }

    async fn upsert(&self, session: &Session) -> Result<()> {
        Self::check(&self.fail_writes)?;
        self.inner.upsert(session).await
    }

    async fn delete(&self, owner_id: &str, id: &SessionId) -> Result<()> {
        Self::check(&self.fail_writes)?;
        self.inner.delete(owner_id, id).await
    }

    fn name(&self) -> &str {
        "flaky-memory"
    }
}

/// A manager wired to flaky backends, with handles to both.
pub struct Harness {
    pub manager: SessionManager,
    pub cache: FlakyCache,
    pub store: FlakyStore,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(SessionPolicy::default())
    }

    pub fn with_policy(policy: SessionPolicy) -> Self {
        let cache = FlakyCache::new();
        let store = FlakyStore::new();
        let manager = SessionManager::new(
            Arc::new(cache.clone()),
            Arc::new(store.clone()),
            policy,
        );
        Self {
            manager,
            cache,
            store,
        }
    }

    pub fn key(&self, owner_id: &str, id: &SessionId) -> String {
        self.manager.keys().session_key(owner_id, id)
    }

    /// Parsed cache entry for a session, bypassing the manager.
    pub async fn cached(&self, owner_id: &str, id: &SessionId) -> Option<Session> {
        let raw = self.cache.inner.get(&self.key(owner_id, id)).await.ok()??;
        serde_json::from_str(&raw).ok()
    }
}
