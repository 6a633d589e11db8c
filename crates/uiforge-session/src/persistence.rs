//! Durable store abstraction.
//!
//! The [`DurableStore`] trait decouples the session manager from a concrete
//! database. Implementations must scope every call to the given owner: a
//! record owned by someone else is indistinguishable from a missing one.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::Result;
use crate::types::{Session, SessionId};

/// Store of record for persisted sessions.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Load one session by `(id, owner)`.
    async fn get(&self, owner_id: &str, id: &SessionId) -> Result<Option<Session>>;

    /// All sessions of `owner_id`, most recently updated first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Session>>;

    /// Insert or replace a session keyed by `(id, ownerId)`.
    ///
    /// Must never overwrite a record that belongs to a different owner.
    async fn upsert(&self, session: &Session) -> Result<()>;

    /// Remove a session. Removing a missing record is not an error.
    async fn delete(&self, owner_id: &str, id: &SessionId) -> Result<()>;

    /// Backend name, for logs.
    fn name(&self) -> &str;
}

/// Process-local durable store.
///
/// Data lives only as long as the process. Useful for tests and for running
/// the server without a database file.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records across all owners.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Whether `id` is stored, regardless of owner.
    pub fn contains(&self, id: &SessionId) -> bool {
        self.records.read().contains_key(id)
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn get(&self, owner_id: &str, id: &SessionId) -> Result<Option<Session>> {
        Ok(self
            .records
            .read()
            .get(id)
            .filter(|s| s.owner_id == owner_id)
            .cloned())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .records
            .read()
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| std::cmp::Reverse(s.last_activity()));
        Ok(sessions)
    }

    async fn upsert(&self, session: &Session) -> Result<()> {
        let mut records = self.records.write();
        match records.get(&session.id) {
            Some(existing) if existing.owner_id != session.owner_id => {}
            _ => {
                records.insert(session.id.clone(), session.clone());
            }
        }
        Ok(())
    }

    async fn delete(&self, owner_id: &str, id: &SessionId) -> Result<()> {
        let mut records = self.records.write();
        if records.get(id).is_some_and(|s| s.owner_id == owner_id) {
            records.remove(id);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
