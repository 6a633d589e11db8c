//! Cache key naming.
//!
//! Keys have the form `<prefix>:session:<hex(ownerId)>:<sessionId>`. The owner
//! id is hex encoded so it can never contain the separator or a glob
//! metacharacter, which keeps every owner's key prefix disjoint from every
//! other owner's keys.

use crate::types::SessionId;

/// Namespace segment between the prefix and the owner scope.
const SESSION_NAMESPACE: &str = "session";

/// Builds cache keys and per-owner scan prefixes.
#[derive(Debug, Clone)]
pub struct KeyScheme {
    prefix: String,
}

impl KeyScheme {
    /// Create a key scheme with the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Composite key for one session.
    pub fn session_key(&self, owner_id: &str, session_id: &SessionId) -> String {
        format!("{}{}", self.owner_prefix(owner_id), session_id)
    }

    /// Literal prefix shared by every key of `owner_id`.
    pub fn owner_prefix(&self, owner_id: &str) -> String {
        format!(
            "{}:{}:{}:",
            self.prefix,
            SESSION_NAMESPACE,
            hex::encode(owner_id)
        )
    }
}
