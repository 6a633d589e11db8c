//! Error types for the server.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use uiforge_llm::LlmError;

/// Message returned for every failure whose detail stays in the logs.
const INTERNAL_MESSAGE: &str = "Internal server error";

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Upstream provider throttled us.
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// A dependency is not configured or did not answer.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Upstream provider returned something unusable.
    #[error("Upstream error: {0}")]
    BadGateway(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<uiforge_session::Error> for ServerError {
    fn from(e: uiforge_session::Error) -> Self {
        match e {
            uiforge_session::Error::NotFound(_) => {
                ServerError::NotFound("Session not found".to_string())
            }
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<LlmError> for ServerError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::InvalidRequest(msg) => ServerError::BadRequest(msg),
            LlmError::RateLimited(msg) => ServerError::RateLimited(msg),
            LlmError::Timeout(_) | LlmError::Network(_) | LlmError::Config(_) => {
                ServerError::ServiceUnavailable(e.to_string())
            }
            LlmError::Backend { .. } | LlmError::EmptyResponse | LlmError::Serialization(_) => {
                ServerError::BadGateway(e.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ServerError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ServerError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            ServerError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
            }
            ServerError::BadGateway(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            ServerError::Internal(detail) => {
                tracing::error!(status = %status, code, error = %detail, "Server error");
                INTERNAL_MESSAGE.to_string()
            }
            ServerError::ServiceUnavailable(_) | ServerError::BadGateway(_) => {
                tracing::warn!(status = %status, code, error = %self, "Upstream error");
                self.to_string()
            }
            _ => {
                tracing::debug!(status = %status, code, error = %self, "Client error");
                self.to_string()
            }
        };

        let body = ErrorResponse {
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
