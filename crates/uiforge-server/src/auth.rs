//! Authentication middleware.
//!
//! Resolves every API request to a user id before any handler runs. Three
//! sources are supported, checked in order:
//!
//! 1. Local mode: no tokens and no proxy header configured, every request
//!    acts as the configured local user.
//! 2. `Authorization: Bearer <token>` matched against the configured tokens.
//! 3. A user id header set by a trusted reverse proxy.
//!
//! # Security
//!
//! Token comparison uses constant-time comparison to prevent timing attacks,
//! and every configured token is compared so the match position is not leaked.

use axum::{
    Json,
    body::Body,
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::config::ServerConfig;
use crate::error::ErrorResponse;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Identity {
    /// Authenticated via bearer token.
    Token { user: String },
    /// Asserted by a trusted proxy header.
    Proxy { user: String },
    /// Local mode, no authentication configured.
    Local { user: String },
}

impl Identity {
    /// The owner id sessions are scoped to.
    pub fn user_id(&self) -> &str {
        match self {
            Identity::Token { user } | Identity::Proxy { user } | Identity::Local { user } => user,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth Error
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication error. Every variant is rendered as 401.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization token")]
    MissingToken,
    #[error("Invalid authorization format")]
    InvalidFormat,
    #[error("Invalid token")]
    InvalidToken,
    #[error("User not allowed")]
    UserNotAllowed,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        tracing::debug!(reason = %self, "Rejected unauthenticated request");
        let body = ErrorResponse {
            code: "unauthorized".to_string(),
            message: self.to_string(),
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Security Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Compare two strings in constant time.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    if a_bytes.len() == b_bytes.len() {
        a_bytes.ct_eq(b_bytes).into()
    } else {
        let _ = a_bytes.ct_eq(a_bytes);
        false
    }
}

/// Find the user a bearer token belongs to, comparing against every token.
fn match_token(config: &ServerConfig, presented: &str) -> Option<String> {
    let mut matched = None;
    for entry in &config.api_tokens {
        if constant_time_eq(presented, &entry.token) && matched.is_none() {
            matched = Some(entry.user_id.clone());
        }
    }
    matched
}

// ─────────────────────────────────────────────────────────────────────────────
// Middleware
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication middleware function.
///
/// Validates the request and injects the `Identity` into request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = validate_request(&request, state.config())?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Validate a request and return the identity.
fn validate_request(request: &Request<Body>, config: &ServerConfig) -> Result<Identity, AuthError> {
    if config.is_local_mode() {
        return Ok(Identity::Local {
            user: config.local_user.clone(),
        });
    }

    if let Some(auth_header) = request.headers().get(AUTHORIZATION) {
        let auth_str = auth_header.to_str().map_err(|_| AuthError::InvalidFormat)?;
        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidFormat)?;

        return match_token(config, token.trim())
            .map(|user| Identity::Token { user })
            .ok_or(AuthError::InvalidToken);
    }

    if let Some(header) = &config.proxy_header
        && let Some(value) = request.headers().get(header.as_str())
    {
        let user = value.to_str().map_err(|_| AuthError::InvalidFormat)?.trim();
        if user.is_empty() {
            return Err(AuthError::InvalidFormat);
        }
        if !config.allowed_users.is_empty() && !config.allowed_users.iter().any(|u| u == user) {
            return Err(AuthError::UserNotAllowed);
        }
        return Ok(Identity::Proxy {
            user: user.to_string(),
        });
    }

    Err(AuthError::MissingToken)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
