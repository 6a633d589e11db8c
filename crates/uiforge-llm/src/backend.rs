//! Generator trait and request/response types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// ─────────────────────────────────────────────────────────────────────────────
// Request / Response
// ─────────────────────────────────────────────────────────────────────────────

/// A prompt plus the artifact it should build on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// What the user asked for.
    pub prompt: String,

    /// Previously generated source, when iterating on it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl GenerationRequest {
    /// A request without prior context.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            context: None,
        }
    }

    /// Attach the previous artifact. Blank context is dropped.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        self.context = (!context.trim().is_empty()).then_some(context);
        self
    }

    /// The single text turn sent to the provider.
    pub fn to_prompt_text(&self) -> String {
        match &self.context {
            Some(code) => format!(
                "Here is the current component code:\n\n```\n{}\n```\n\n{}",
                code.trim_end(),
                self.prompt
            ),
            None => self.prompt.clone(),
        }
    }
}

/// Generated text returned by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    /// The generated source text.
    pub text: String,

    /// The provider stopped at its output token limit.
    pub truncated: bool,

    /// Model that produced the text.
    pub model: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Generator Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A generative text provider.
///
/// Implementations make a single request and do not retry; failures are
/// surfaced to the caller as [`LlmError`](crate::LlmError).
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate text for the request.
    async fn generate(&self, request: GenerationRequest) -> Result<Generation>;

    /// Name of this provider.
    fn name(&self) -> &str;
}

// ─────────────────────────────────────────────────────────────────────────────
// Mock Generator
// ─────────────────────────────────────────────────────────────────────────────

/// A mock generator for testing purposes.
///
/// Returns pre-configured results in order and records every request.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Default)]
pub struct MockGenerator {
    responses: parking_lot::Mutex<Vec<Result<Generation>>>,
    request_log: parking_lot::Mutex<Vec<GenerationRequest>>,
}

#[cfg(any(test, feature = "testing"))]
impl MockGenerator {
    /// Create a mock with the given results, returned in order.
    pub fn new(responses: Vec<Result<Generation>>) -> Self {
        Self {
            responses: parking_lot::Mutex::new(responses),
            request_log: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Create a mock with a single text response.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(vec![Ok(Generation {
            text: text.into(),
            truncated: false,
            model: "mock-model".to_string(),
        })])
    }

    /// Create a mock that fails once with `error`.
    pub fn with_error(error: crate::LlmError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// All requests made so far.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.request_log.lock().clone()
    }

    /// Number of requests made so far.
    pub fn request_count(&self) -> usize {
        self.request_log.lock().len()
    }
}

#[cfg(any(test, feature = "testing"))]
#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<Generation> {
        self.request_log.lock().push(request);

        let mut responses = self.responses.lock();
        if responses.is_empty() {
            return Err(crate::LlmError::InvalidRequest(
                "MockGenerator: no more responses available".to_string(),
            ));
        }
        responses.remove(0)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
