//! GeminiBackend against a local stand-in for the provider API.

use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use uiforge_llm::{GeminiBackend, GeminiConfig, GenerationRequest, Generator, LlmError};

/// Start a fake provider and return its base URL.
async fn spawn_provider() -> String {
    async fn generate(
        Path(model_action): Path<String>,
        Query(query): Query<std::collections::HashMap<String, String>>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        if query.get("key").map(String::as_str) != Some("test-key") {
            return (
                StatusCode::FORBIDDEN,
                Json(json!({"error": {"message": "API key not valid"}})),
            );
        }

        let prompt = body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        match prompt.as_str() {
            "throttle" => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({"error": {"message": "Resource has been exhausted"}})),
            ),
            "slow" => {
                tokio::time::sleep(Duration::from_secs(2)).await;
                (StatusCode::OK, Json(json!({})))
            }
            "blocked" => (
                StatusCode::OK,
                Json(json!({"candidates": [{"finishReason": "SAFETY"}]})),
            ),
            _ => (
                StatusCode::OK,
                Json(json!({
                    "candidates": [{
                        "content": {"role": "model", "parts": [{"text": format!("echo:{prompt}")}]},
                        "finishReason": "STOP"
                    }],
                    "modelVersion": model_action.trim_end_matches(":generateContent")
                })),
            ),
        }
    }

    let app = Router::new().route("/v1/models/{model_action}", post(generate));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/v1")
}

fn backend(base_url: &str, key: &str) -> GeminiBackend {
    GeminiBackend::new(
        GeminiConfig::new(key)
            .with_base_url(base_url)
            .with_model("gemini-test")
            .with_timeout(Duration::from_millis(500)),
    )
    .unwrap()
}

#[tokio::test]
async fn generates_text() {
    let base = spawn_provider().await;
    let generation = backend(&base, "test-key")
        .generate(GenerationRequest::new("make a button"))
        .await
        .unwrap();

    assert_eq!(generation.text, "echo:make a button");
    assert_eq!(generation.model, "gemini-test");
    assert!(!generation.truncated);
}

#[tokio::test]
async fn sends_context_in_prompt() {
    let base = spawn_provider().await;
    let generation = backend(&base, "test-key")
        .generate(GenerationRequest::new("make it red").with_context("<button/>"))
        .await
        .unwrap();

    assert!(generation.text.contains("<button/>"));
    assert!(generation.text.ends_with("make it red"));
}

#[tokio::test]
async fn maps_rate_limit() {
    let base = spawn_provider().await;
    let err = backend(&base, "test-key")
        .generate(GenerationRequest::new("throttle"))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::RateLimited(ref m) if m.contains("exhausted")));
}

#[tokio::test]
async fn maps_timeout() {
    let base = spawn_provider().await;
    let err = backend(&base, "test-key")
        .generate(GenerationRequest::new("slow"))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::Timeout(_)));
}

#[tokio::test]
async fn maps_empty_output() {
    let base = spawn_provider().await;
    let err = backend(&base, "test-key")
        .generate(GenerationRequest::new("blocked"))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::EmptyResponse));
}

#[tokio::test]
async fn maps_bad_key_to_backend_error() {
    let base = spawn_provider().await;
    let err = backend(&base, "wrong")
        .generate(GenerationRequest::new("hello"))
        .await
        .unwrap_err();

    match err {
        LlmError::Backend { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "API key not valid");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn rejects_empty_prompt_without_calling() {
    let err = backend("http://127.0.0.1:1/v1", "test-key")
        .generate(GenerationRequest::new("   "))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::InvalidRequest(_)));
}

#[tokio::test]
async fn unreachable_provider_is_network_error() {
    let err = backend("http://127.0.0.1:1/v1", "test-key")
        .generate(GenerationRequest::new("hello"))
        .await
        .unwrap_err();

    assert!(err.is_unavailable());
}
