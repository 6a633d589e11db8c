//! Session data model and the typed partial update.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Separator between the owner scope and the random part of a session id.
const ID_SEPARATOR: char = '.';

/// Length of the random part of a session id (simple-format UUID).
const ID_RANDOM_LEN: usize = 32;

/// Maximum length of a name derived from the first user message.
const DERIVED_NAME_MAX_CHARS: usize = 50;

// ─────────────────────────────────────────────────────────────────────────────
// SessionId
// ─────────────────────────────────────────────────────────────────────────────

/// Owner-scoped session identifier.
///
/// Generated ids have the form `<ownerId>.<32 hex>`. The owner portion is
/// recovered by splitting on the last separator, so an id can only ever be
/// owned by the exact user it was allocated for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Allocate a fresh id for `owner_id`.
    pub fn generate(owner_id: &str) -> Self {
        Self(format!(
            "{}{}{}",
            owner_id,
            ID_SEPARATOR,
            Uuid::new_v4().simple()
        ))
    }

    /// Owner scope encoded in this id, if the id is well formed.
    pub fn owner(&self) -> Option<&str> {
        let (owner, random) = self.0.rsplit_once(ID_SEPARATOR)?;
        let well_formed = !owner.is_empty()
            && random.len() == ID_RANDOM_LEN
            && random.bytes().all(|b| b.is_ascii_hexdigit());
        well_formed.then_some(owner)
    }

    /// Whether this id was allocated for `owner_id`.
    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner() == Some(owner_id)
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ChatMessage
// ─────────────────────────────────────────────────────────────────────────────

/// One chat turn, stored exactly as the client sent it.
///
/// The record is an opaque JSON object; `role` (or the older `type`) and
/// `content` are only read for naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatMessage(Map<String, Value>);

impl ChatMessage {
    /// Create a message stamped with the current time.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("role".to_string(), Value::String(role.into()));
        fields.insert("content".to_string(), Value::String(content.into()));
        fields.insert(
            "timestamp".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        Self(fields)
    }

    /// Author role, read from `role` or `type`.
    pub fn role(&self) -> Option<&str> {
        self.0
            .get("role")
            .or_else(|| self.0.get("type"))
            .and_then(Value::as_str)
    }

    /// Message text, if it is a string.
    pub fn content(&self) -> Option<&str> {
        self.0.get("content").and_then(Value::as_str)
    }

    /// Whether this message was written by the user.
    pub fn is_user(&self) -> bool {
        self.role() == Some("user")
    }

    /// Every field of the record.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for ChatMessage {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// A saved or draft unit of chat history plus its latest generated artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub owner_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub code: String,
    #[serde(default = "empty_object")]
    pub ui: Value,
    #[serde(default)]
    pub is_temporary: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Build a fresh draft with a newly allocated id.
    pub fn draft(owner_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::generate(owner_id),
            owner_id: owner_id.to_string(),
            name: default_name(now),
            messages: Vec::new(),
            code: String::new(),
            ui: empty_object(),
            is_temporary: true,
            created_at: now,
            updated_at: Some(now),
        }
    }

    /// Bare record used when an update targets an id neither store knows.
    pub fn skeleton(id: SessionId, owner_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id: owner_id.to_string(),
            name: default_name(now),
            messages: Vec::new(),
            code: String::new(),
            ui: empty_object(),
            is_temporary: true,
            created_at: now,
            updated_at: None,
        }
    }

    /// Timestamp used for recency ordering.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }

    /// A draft with no content; never shown in listings.
    pub fn is_empty_draft(&self) -> bool {
        self.is_temporary && self.messages.is_empty()
    }

    /// Merge a partial update over this record.
    ///
    /// Fields present in the patch win; absent fields keep their value.
    pub fn apply(&mut self, patch: SessionPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(messages) = patch.messages {
            self.messages = messages;
        }
        if let Some(code) = patch.code {
            self.code = code;
        }
        if let Some(ui) = patch.ui {
            self.ui = ui;
        }
    }
}

/// Label given to sessions at creation time.
pub fn default_name(now: DateTime<Utc>) -> String {
    format!("Session {}", now.format("%Y-%m-%d %H:%M"))
}

/// Label derived from the first user message, if there is one.
pub fn name_from_messages(messages: &[ChatMessage]) -> Option<String> {
    let first = messages
        .iter()
        .filter(|m| m.is_user())
        .filter_map(ChatMessage::content)
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|text| !text.is_empty())?;

    if first.chars().count() <= DERIVED_NAME_MAX_CHARS {
        return Some(first);
    }
    let truncated: String = first.chars().take(DERIVED_NAME_MAX_CHARS).collect();
    Some(format!("{}...", truncated.trim_end()))
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

// ─────────────────────────────────────────────────────────────────────────────
// SessionPatch
// ─────────────────────────────────────────────────────────────────────────────

/// Partial update accepted from clients.
///
/// Only `name`, `messages`, `code` and `ui` are applied. Server-owned fields
/// that clients commonly echo back are accepted and discarded; anything else
/// is rejected during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui: Option<Value>,

    #[serde(default, skip_serializing, alias = "_id")]
    id: Option<IgnoredAny>,
    #[serde(default, skip_serializing, alias = "userId")]
    owner_id: Option<IgnoredAny>,
    #[serde(default, skip_serializing)]
    is_temporary: Option<IgnoredAny>,
    #[serde(default, skip_serializing)]
    created_at: Option<IgnoredAny>,
    #[serde(default, skip_serializing)]
    updated_at: Option<IgnoredAny>,
}

impl SessionPatch {
    /// An empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the message list.
    pub fn with_messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = Some(messages);
        self
    }

    /// Set the generated artifact.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the UI metadata.
    pub fn with_ui(mut self, ui: Value) -> Self {
        self.ui = Some(ui);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generated_id_is_owned_by_its_owner() {
        let id = SessionId::generate("alice");
        assert!(id.is_owned_by("alice"));
        assert!(!id.is_owned_by("bob"));
        assert!(!id.is_owned_by("alic"));
    }

    #[test]
    fn test_owner_with_separator_in_name() {
        let id = SessionId::generate("a.b");
        assert_eq!(id.owner(), Some("a.b"));
        assert!(!id.is_owned_by("a"));
    }

    #[test]
    fn test_malformed_id_has_no_owner() {
        assert_eq!(SessionId::from("work_1700000000").owner(), None);
        assert_eq!(SessionId::from("alice.short").owner(), None);
        assert_eq!(
            SessionId::from(".0123456789abcdef0123456789abcdef").owner(),
            None
        );
    }

    #[test]
    fn test_session_serializes_camel_case() {
        let session = Session::draft("alice", Utc::now());
        let value = serde_json::to_value(&session).unwrap();

        assert_eq!(value["ownerId"], "alice");
        assert_eq!(value["isTemporary"], true);
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        assert_eq!(value["ui"], json!({}));
    }

    #[test]
    fn test_session_tolerates_missing_optional_fields() {
        let raw = json!({
            "id": "alice.0123456789abcdef0123456789abcdef",
            "ownerId": "alice",
            "createdAt": "2024-05-01T10:00:00Z"
        });
        let session: Session = serde_json::from_value(raw).unwrap();

        assert!(session.messages.is_empty());
        assert!(session.updated_at.is_none());
        assert_eq!(session.last_activity(), session.created_at);
        assert_eq!(session.ui, json!({}));
    }

    #[test]
    fn test_message_round_trips_client_shape() {
        let raw = json!({
            "id": 1700000000000_u64,
            "type": "user",
            "content": "make a button",
            "timestamp": "10:23:45 AM",
            "image": null,
            "codeBlocks": [{ "language": "jsx", "code": "<button/>" }]
        });
        let message: ChatMessage = serde_json::from_value(raw.clone()).unwrap();

        assert!(message.is_user());
        assert_eq!(message.content(), Some("make a button"));
        assert_eq!(serde_json::to_value(&message).unwrap(), raw);
    }

    #[test]
    fn test_patch_accepts_client_messages() {
        let raw = json!({
            "messages": [
                { "id": 1, "type": "user", "content": "hi", "timestamp": "9:00:01 PM" },
                { "id": 2, "type": "ai", "content": 42 }
            ]
        });
        let patch: SessionPatch = serde_json::from_value(raw.clone()).unwrap();
        let messages = patch.messages.unwrap();

        assert_eq!(messages[1].role(), Some("ai"));
        assert_eq!(messages[1].content(), None);
        assert_eq!(serde_json::to_value(&messages).unwrap(), raw["messages"]);
    }

    #[test]
    fn test_apply_overrides_present_fields_only() {
        let mut session = Session::draft("alice", Utc::now());
        session.code = "<div/>".to_string();

        session.apply(SessionPatch::new().with_name("Buttons"));

        assert_eq!(session.name, "Buttons");
        assert_eq!(session.code, "<div/>");
        assert!(session.messages.is_empty());
    }

    #[test]
    fn test_patch_ignores_echoed_server_fields() {
        let raw = json!({
            "_id": "alice.0123456789abcdef0123456789abcdef",
            "userId": "mallory",
            "isTemporary": false,
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:00:00Z",
            "code": "x"
        });
        let patch: SessionPatch = serde_json::from_value(raw).unwrap();

        assert_eq!(patch.code.as_deref(), Some("x"));
        assert!(patch.messages.is_none());
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let raw = json!({ "code": "x", "priority": 3 });
        assert!(serde_json::from_value::<SessionPatch>(raw).is_err());
    }

    #[test]
    fn test_name_from_first_user_message() {
        let messages = vec![
            ChatMessage::new("assistant", "Hello!"),
            ChatMessage::new("user", "  make   a\nbutton "),
        ];
        assert_eq!(name_from_messages(&messages).as_deref(), Some("make a button"));
    }

    #[test]
    fn test_name_from_long_message_is_truncated() {
        let long = "x".repeat(80);
        let name = name_from_messages(&[ChatMessage::new("user", long)]).unwrap();
        assert_eq!(name.chars().count(), DERIVED_NAME_MAX_CHARS + 3);
        assert!(name.ends_with("..."));
    }

    #[test]
    fn test_name_reads_legacy_type_field() {
        let message: ChatMessage =
            serde_json::from_value(json!({ "type": "user", "content": "navbar" })).unwrap();
        assert_eq!(name_from_messages(&[message]).as_deref(), Some("navbar"));
    }

    #[test]
    fn test_name_without_user_message() {
        assert!(name_from_messages(&[ChatMessage::new("assistant", "hi")]).is_none());
        assert!(name_from_messages(&[]).is_none());
    }
}
