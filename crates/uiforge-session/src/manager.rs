//! Session lifecycle over a fast cache and a durable store.

use std::cmp::Reverse;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::cache::FastCache;
use crate::config::SessionPolicy;
use crate::error::{Error, Result};
use crate::keys::KeyScheme;
use crate::persistence::DurableStore;
use crate::types::{Session, SessionId, SessionPatch, name_from_messages};

/// Where an existing record was resolved from during an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Cache,
    Store,
    Skeleton,
}

/// Single authority for reading and writing sessions.
///
/// The durable store is authoritative for persisted sessions; the cache holds
/// drafts and accelerates reads. A session is persisted exactly when its
/// message list is non-empty.
pub struct SessionManager {
    cache: Arc<dyn FastCache>,
    store: Arc<dyn DurableStore>,
    policy: SessionPolicy,
    keys: KeyScheme,
}

impl SessionManager {
    /// Create a manager over the given backends.
    pub fn new(
        cache: Arc<dyn FastCache>,
        store: Arc<dyn DurableStore>,
        policy: SessionPolicy,
    ) -> Self {
        let keys = KeyScheme::new(policy.key_prefix.clone());
        Self {
            cache,
            store,
            policy,
            keys,
        }
    }

    /// The lifecycle policy in effect.
    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// The key scheme used for cache entries.
    pub fn keys(&self) -> &KeyScheme {
        &self.keys
    }

    // ── List ────────────────────────────────────────────────────────

    /// Sessions of `owner_id`, newest first, headed by a fresh unsaved draft.
    ///
    /// When the cache holds any readable entry for the owner it is used as is,
    /// without consulting the store. A record removed from the store by
    /// another process therefore stays visible until its cache entry expires.
    pub async fn list(&self, owner_id: &str) -> Result<Vec<Session>> {
        let prefix = self.keys.owner_prefix(owner_id);
        let keys = self.cache.keys_with_prefix(&prefix).await?;

        let cached = if keys.is_empty() {
            Vec::new()
        } else {
            self.read_cached(&keys).await?
        };

        let mut sessions = if cached.is_empty() {
            let stored = self.store.list_by_owner(owner_id).await?;
            debug!(
                owner_id = %owner_id,
                cache_keys = keys.len(),
                count = stored.len(),
                "No cached sessions for owner, listed from store"
            );
            for session in &stored {
                self.write_back(session).await;
            }
            stored
        } else {
            debug!(owner_id = %owner_id, count = cached.len(), "Listed sessions from cache");
            cached
        };

        sessions.retain(|s| s.owner_id == owner_id && !s.is_empty_draft());
        sessions.sort_by_key(|s| Reverse(s.last_activity()));
        sessions.insert(0, Session::draft(owner_id, Utc::now()));

        Ok(sessions)
    }

    // ── Create ──────────────────────────────────────────────────────

    /// Allocate a new draft. Nothing is written to either store.
    pub fn create(&self, owner_id: &str) -> Session {
        let session = Session::draft(owner_id, Utc::now());
        debug!(owner_id = %owner_id, session_id = %session.id, "Allocated draft session");
        session
    }

    // ── Get ─────────────────────────────────────────────────────────

    /// Load one session, repopulating the cache from the store on a miss.
    pub async fn get(&self, owner_id: &str, id: &SessionId) -> Result<Session> {
        self.ensure_owned(owner_id, id)?;

        if let Some(session) = self.read_cache(owner_id, id).await? {
            return Ok(session);
        }

        match self.store.get(owner_id, id).await? {
            Some(session) => {
                self.write_back(&session).await;
                Ok(session)
            }
            None => Err(Error::NotFound(id.to_string())),
        }
    }

    // ── Update ──────────────────────────────────────────────────────

    /// Merge `patch` into the session and save it.
    ///
    /// With a non-empty message list the result is upserted into the store
    /// before the cache is refreshed; the call fails if the store write fails.
    /// With an empty message list the result is cached as a draft and any
    /// stored copy is removed.
    pub async fn update(
        &self,
        owner_id: &str,
        id: &SessionId,
        patch: SessionPatch,
    ) -> Result<Session> {
        self.ensure_owned(owner_id, id)?;
        let now = Utc::now();

        let (mut session, origin) = match self.read_cache(owner_id, id).await? {
            Some(session) => (session, Origin::Cache),
            None => match self.store.get(owner_id, id).await? {
                Some(session) => (session, Origin::Store),
                None => (Session::skeleton(id.clone(), owner_id, now), Origin::Skeleton),
            },
        };
        let was_persisted = origin == Origin::Store || !session.is_temporary;

        let was_draft = session.is_temporary;
        let name_given = patch.name.is_some();

        session.apply(patch);
        if was_draft
            && !name_given
            && let Some(name) = name_from_messages(&session.messages)
        {
            session.name = name;
        }
        session.updated_at = Some(now);
        session.is_temporary = session.messages.is_empty();

        let key = self.keys.session_key(owner_id, id);
        let ttl = self.policy.ttl_for(session.is_temporary);
        let value = serde_json::to_string(&session)?;

        if session.is_temporary {
            if was_persisted {
                self.store.delete(owner_id, id).await?;
                info!(owner_id = %owner_id, session_id = %id, "Session emptied, removed from store");
            }
            self.cache.set(&key, value, ttl).await?;
            debug!(owner_id = %owner_id, session_id = %id, "Saved draft session");
        } else {
            self.store.upsert(&session).await?;
            if let Err(e) = self.cache.set(&key, value, ttl).await {
                warn!(
                    owner_id = %owner_id,
                    session_id = %id,
                    error = %e,
                    "Session stored but cache refresh failed"
                );
            }
            if !was_persisted {
                info!(owner_id = %owner_id, session_id = %id, "Draft session persisted");
            }
            debug!(
                owner_id = %owner_id,
                session_id = %id,
                messages = session.messages.len(),
                "Saved session"
            );
        }

        Ok(session)
    }

    // ── Delete ──────────────────────────────────────────────────────

    /// Remove a session from both stores. Idempotent.
    ///
    /// An id with no owner scope can never have been stored, so deleting it
    /// succeeds without touching either store.
    pub async fn delete(&self, owner_id: &str, id: &SessionId) -> Result<()> {
        if id.owner().is_none() {
            debug!(owner_id = %owner_id, session_id = %id, "Unscoped session id, nothing to delete");
            return Ok(());
        }
        self.ensure_owned(owner_id, id)?;
        let key = self.keys.session_key(owner_id, id);

        let (cached, stored) = tokio::join!(self.cache.delete(&key), self.store.delete(owner_id, id));
        stored?;
        cached?;

        info!(owner_id = %owner_id, session_id = %id, "Deleted session");
        Ok(())
    }

    // ── Helpers ─────────────────────────────────────────────────────

    fn ensure_owned(&self, owner_id: &str, id: &SessionId) -> Result<()> {
        if id.is_owned_by(owner_id) {
            Ok(())
        } else {
            debug!(owner_id = %owner_id, session_id = %id, "Session id not owned by requester");
            Err(Error::NotFound(id.to_string()))
        }
    }

    /// Parsed cache entries for `keys`, skipping missing and unreadable ones.
    async fn read_cached(&self, keys: &[String]) -> Result<Vec<Session>> {
        let values = self.cache.get_many(keys).await?;
        let mut cached = Vec::with_capacity(values.len());
        for (key, value) in keys.iter().zip(values) {
            let Some(raw) = value else { continue };
            match serde_json::from_str::<Session>(&raw) {
                Ok(session) => cached.push(session),
                Err(e) => warn!(key = %key, error = %e, "Skipping unreadable cache entry"),
            }
        }
        Ok(cached)
    }

    /// Cached copy of a session. Unreadable or foreign entries count as a miss.
    async fn read_cache(&self, owner_id: &str, id: &SessionId) -> Result<Option<Session>> {
        let key = self.keys.session_key(owner_id, id);
        let Some(raw) = self.cache.get(&key).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) if session.owner_id == owner_id => Ok(Some(session)),
            Ok(_) => {
                warn!(key = %key, "Cache entry owned by another user, ignoring");
                Ok(None)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Unreadable cache entry, ignoring");
                Ok(None)
            }
        }
    }

    /// Best-effort cache repopulation after a store read.
    async fn write_back(&self, session: &Session) {
        let key = self.keys.session_key(&session.owner_id, &session.id);
        let ttl = self.policy.ttl_for(session.is_temporary);

        let result = match serde_json::to_string(session) {
            Ok(value) => self.cache.set(&key, value, ttl).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            warn!(key = %key, error = %e, "Cache write-back failed");
        }
    }
}
