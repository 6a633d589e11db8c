//! Server configuration.

use std::net::SocketAddr;

/// Default max body size for REST requests (2 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Default user id when no authentication is configured.
pub const DEFAULT_LOCAL_USER: &str = "local";

/// A bearer token and the user it authenticates.
#[derive(Clone)]
pub struct ApiToken {
    pub user_id: String,
    pub token: String,
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiToken")
            .field("user_id", &self.user_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Accepted bearer tokens.
    pub api_tokens: Vec<ApiToken>,

    /// Header set by a trusted reverse proxy carrying the user id.
    pub proxy_header: Option<String>,

    /// If non-empty, only these proxy users are accepted.
    pub allowed_users: Vec<String>,

    /// User every request acts as when neither tokens nor a proxy header
    /// are configured.
    pub local_user: String,

    /// Enable request logging.
    pub request_logging: bool,

    /// CORS allowed origins (empty = no CORS).
    pub cors_origins: Vec<String>,

    /// Maximum REST request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            api_tokens: Vec::new(),
            proxy_header: None,
            allowed_users: Vec::new(),
            local_user: DEFAULT_LOCAL_USER.to_string(),
            request_logging: true,
            cors_origins: Vec::new(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl ServerConfig {
    /// Create a config in local mode on the default address.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Accept `token` as authenticating `user_id`.
    pub fn with_token(mut self, user_id: impl Into<String>, token: impl Into<String>) -> Self {
        self.api_tokens.push(ApiToken {
            user_id: user_id.into(),
            token: token.into(),
        });
        self
    }

    /// Trust a proxy header for the user id.
    pub fn with_proxy_header(mut self, header: impl Into<String>) -> Self {
        self.proxy_header = Some(header.into());
        self
    }

    /// Restrict proxy-authenticated users.
    pub fn with_allowed_users(mut self, users: Vec<String>) -> Self {
        self.allowed_users = users;
        self
    }

    /// Set the local-mode user.
    pub fn with_local_user(mut self, user: impl Into<String>) -> Self {
        self.local_user = user.into();
        self
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    /// Set CORS allowed origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Set the maximum REST request body size.
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Neither tokens nor a proxy header configured.
    pub fn is_local_mode(&self) -> bool {
        self.api_tokens.is_empty() && self.proxy_header.is_none()
    }
}
