//! Health and identity endpoints.

use axum::{Extension, Json, Router, routing::get};
use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// The identity a request resolved to.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoAmIResponse {
    pub user_id: String,
}

/// Simple health check (no auth required).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/v1/me
pub async fn whoami_handler(Extension(identity): Extension<Identity>) -> Json<WhoAmIResponse> {
    Json(WhoAmIResponse {
        user_id: identity.user_id().to_string(),
    })
}

/// Create health check routes.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
