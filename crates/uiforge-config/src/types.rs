//! Configuration types.
//!
//! Every section is optional in the file. Accessors on [`UiforgeConfig`]
//! return the section or its defaults, so callers never deal with `None`.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiforgeConfig {
    /// HTTP server settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    /// Identity resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,

    /// Fast cache backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheConfig>,

    /// Durable store backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreConfig>,

    /// Session lifetimes and key prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionConfig>,

    /// Generation provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationConfig>,

    /// Log output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

impl UiforgeConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        Ok(config)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one.
    ///
    /// Sections present in `other` replace the matching section here.
    pub fn merge(&mut self, other: UiforgeConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }
        if other.auth.is_some() {
            self.auth = other.auth;
        }
        if other.cache.is_some() {
            self.cache = other.cache;
        }
        if other.store.is_some() {
            self.store = other.store;
        }
        if other.session.is_some() {
            self.session = other.session;
        }
        if other.generation.is_some() {
            self.generation = other.generation;
        }
        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let cache = self.cache();
        if cache.backend == CacheBackend::Redis && cache.redis_url.is_none() {
            return Err(ConfigError::Invalid(
                "[cache] backend = \"redis\" requires redis_url".to_string(),
            ));
        }
        if cache.max_entries == 0 {
            return Err(ConfigError::Invalid(
                "[cache] max_entries must be greater than zero".to_string(),
            ));
        }

        let session = self.session();
        if session.draft_ttl_secs == 0 || session.persisted_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "[session] TTLs must be greater than zero".to_string(),
            ));
        }
        if session.key_prefix.is_empty() || session.key_prefix.contains(['*', '?', '[', ']']) {
            return Err(ConfigError::Invalid(format!(
                "[session] key_prefix '{}' must be non-empty and free of glob characters",
                session.key_prefix
            )));
        }

        let auth = self.auth();
        if auth.tokens.values().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "[auth.tokens] entries must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    // ── Section accessors ───────────────────────────────────────────────

    pub fn server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    pub fn auth(&self) -> AuthConfig {
        self.auth.clone().unwrap_or_default()
    }

    pub fn cache(&self) -> CacheConfig {
        self.cache.clone().unwrap_or_default()
    }

    pub fn store(&self) -> StoreConfig {
        self.store.clone().unwrap_or_default()
    }

    pub fn session(&self) -> SessionConfig {
        self.session.clone().unwrap_or_default()
    }

    pub fn generation(&self) -> GenerationConfig {
        self.generation.clone().unwrap_or_default()
    }

    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────────────────────────────────────

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default request body limit.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Address to bind to.
    pub bind: String,
    /// Log one line per request.
    pub request_logging: bool,
    /// Allowed CORS origins. Empty disables CORS headers.
    pub cors_origins: Vec<String>,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: "127.0.0.1".to_string(),
            request_logging: true,
            cors_origins: Vec::new(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

/// How requests are tied to a user.
///
/// With no tokens and no proxy header, the server runs in local mode and
/// every request acts as `local_user`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer tokens, keyed by the user id they authenticate.
    pub tokens: HashMap<String, String>,
    /// Header set by a trusted reverse proxy carrying the user id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_header: Option<String>,
    /// If non-empty, only these users are accepted from the proxy header.
    pub allowed_users: Vec<String>,
    /// User id for local mode.
    pub local_user: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            tokens: HashMap::new(),
            proxy_header: None,
            allowed_users: Vec::new(),
            local_user: "local".to_string(),
        }
    }
}

impl AuthConfig {
    /// No tokens and no proxy header configured.
    pub fn is_local(&self) -> bool {
        self.tokens.is_empty() && self.proxy_header.is_none()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cache
// ─────────────────────────────────────────────────────────────────────────────

/// Fast cache implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// In-process LRU with per-key expiry.
    #[default]
    Memory,
    /// Shared Redis instance.
    Redis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis_url: Option<String>,
    /// Per-command timeout for Redis, in milliseconds.
    pub timeout_ms: u64,
    /// Capacity of the in-process cache.
    pub max_entries: usize,
    /// Seconds between expiry sweeps of the in-process cache.
    pub cleanup_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            redis_url: None,
            timeout_ms: 500,
            max_entries: 10_000,
            cleanup_interval_secs: 60,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────────────────────────────────────

/// Durable store implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// SQLite database file.
    #[default]
    Sqlite,
    /// Process memory; lost on restart.
    Memory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Database file. Defaults to `sessions.db` in the config directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cache lifetime of drafts.
    pub draft_ttl_secs: u64,
    /// Cache lifetime of persisted sessions.
    pub persisted_ttl_secs: u64,
    /// Namespace for cache keys.
    pub key_prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            draft_ttl_secs: 3600,
            persisted_ttl_secs: 86_400,
            key_prefix: "uiforge".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Generation
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Expose the generate endpoint.
    pub enabled: bool,
    /// API key. Prefer the `GEMINI_API_KEY` environment variable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            model: None,
            base_url: None,
            timeout_secs: 60,
        }
    }
}

impl GenerationConfig {
    /// Whether an API key is stored in the config file.
    pub fn has_plaintext_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Write JSON logs to a daily rolling file.
    pub file: bool,
    /// Log directory. Defaults to `logs/` in the config directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: true,
            dir: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
