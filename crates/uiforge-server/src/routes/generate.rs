//! Component generation endpoint.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use uiforge_llm::{GenerationRequest, Generator};

use crate::auth::Identity;
use crate::error::ServerError;
use crate::state::AppState;

/// Request to generate component source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// What to build or change.
    #[serde(default)]
    pub prompt: String,

    /// Current component source to iterate on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Generated component source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub code: String,

    /// The provider stopped at its output limit; `code` may be incomplete.
    pub truncated: bool,
}

/// POST /api/v1/generate
pub async fn generate_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ServerError> {
    let Json(request) = payload?;

    if request.prompt.trim().is_empty() {
        return Err(ServerError::BadRequest("Prompt is required".to_string()));
    }

    let generator = state.generator.as_ref().ok_or_else(|| {
        ServerError::ServiceUnavailable("Generation is not configured".to_string())
    })?;

    let mut generation_request = GenerationRequest::new(request.prompt);
    if let Some(code) = request.code {
        generation_request = generation_request.with_context(code);
    }

    let generation = generator.generate(generation_request).await?;

    info!(
        user_id = %identity.user_id(),
        provider = generator.name(),
        model = %generation.model,
        output_len = generation.text.len(),
        truncated = generation.truncated,
        "Generated component"
    );

    Ok(Json(GenerateResponse {
        code: generation.text,
        truncated: generation.truncated,
    }))
}
