//! Session persistence for uiforge.
//!
//! Sessions live in two places:
//! - a [`FastCache`] holding every live session under an owner-scoped key with
//!   a state-dependent TTL
//! - a [`DurableStore`] holding every session that has at least one message
//!
//! The [`SessionManager`] is the only component that writes to either. It
//! decides when a draft becomes persisted (first message), keeps drafts out of
//! the durable store, and never returns a record to anyone but its owner.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use uiforge_session::{
//!     CacheConfig, ChatMessage, MemoryCache, MemoryStore, SessionManager, SessionPatch,
//!     SessionPolicy,
//! };
//!
//! let manager = SessionManager::new(
//!     Arc::new(MemoryCache::new(CacheConfig::default())),
//!     Arc::new(MemoryStore::new()),
//!     SessionPolicy::default(),
//! );
//!
//! let draft = manager.create("alice");
//! let saved = manager
//!     .update(
//!         "alice",
//!         &draft.id,
//!         SessionPatch::new().with_messages(vec![ChatMessage::new("user", "make a button")]),
//!     )
//!     .await?;
//! assert!(!saved.is_temporary);
//! ```

mod cache;
mod config;
mod error;
mod keys;
mod manager;
mod persistence;
mod ttl;
mod types;

pub use cache::{CacheStats, FastCache, MemoryCache};
pub use config::{
    CacheConfig, DEFAULT_DRAFT_TTL, DEFAULT_KEY_PREFIX, DEFAULT_MAX_ENTRIES,
    DEFAULT_PERSISTED_TTL, SessionPolicy,
};
pub use error::{Error, Result};
pub use keys::KeyScheme;
pub use manager::SessionManager;
pub use persistence::{DurableStore, MemoryStore};
pub use types::{ChatMessage, Session, SessionId, SessionPatch, default_name, name_from_messages};
