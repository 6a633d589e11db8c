//! Session management endpoints.

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};

use uiforge_session::{Session, SessionId, SessionPatch};

use crate::auth::Identity;
use crate::error::ServerError;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Response for list sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSessionsResponse {
    /// A fresh unsaved draft, then saved sessions newest first.
    pub sessions: Vec<Session>,
}

/// Response wrapping a single session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session: Session,
}

/// Response for delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteSessionResponse {
    pub message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/sessions
pub async fn list_sessions_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ListSessionsResponse>, ServerError> {
    let sessions = state.sessions.list(identity.user_id()).await?;
    Ok(Json(ListSessionsResponse { sessions }))
}

/// POST /api/v1/sessions/new
///
/// The returned draft is not stored anywhere until its first update.
pub async fn create_session_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Json<SessionResponse> {
    Json(SessionResponse {
        session: state.sessions.create(identity.user_id()),
    })
}

/// GET /api/v1/sessions/{id}
pub async fn get_session_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ServerError> {
    let id = SessionId::from(session_id);
    let session = state.sessions.get(identity.user_id(), &id).await?;
    Ok(Json(SessionResponse { session }))
}

/// PUT /api/v1/sessions/{id}
pub async fn update_session_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(session_id): Path<String>,
    payload: Result<Json<SessionPatch>, JsonRejection>,
) -> Result<Json<SessionResponse>, ServerError> {
    let Json(patch) = payload?;
    let id = SessionId::from(session_id);
    let session = state.sessions.update(identity.user_id(), &id, patch).await?;
    Ok(Json(SessionResponse { session }))
}

/// DELETE /api/v1/sessions/{id}
///
/// Succeeds whether or not the session existed.
pub async fn delete_session_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(session_id): Path<String>,
) -> Result<Json<DeleteSessionResponse>, ServerError> {
    let id = SessionId::from(session_id);
    state.sessions.delete(identity.user_id(), &id).await?;
    Ok(Json(DeleteSessionResponse {
        message: "Session deleted".to_string(),
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
