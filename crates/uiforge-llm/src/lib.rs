//! Generation proxy for uiforge.
//!
//! Forwards a natural-language prompt (plus, optionally, the component source
//! being iterated on) to a generative text provider and returns the generated
//! source. Calls are single-shot: rate limiting, truncation and timeouts are
//! reported, never retried.
//!
//! # Example
//!
//! ```rust,ignore
//! use uiforge_llm::{GeminiBackend, GenerationRequest, Generator};
//!
//! let backend = GeminiBackend::from_env()?;
//! let generation = backend
//!     .generate(GenerationRequest::new("a pricing card with three tiers"))
//!     .await?;
//! println!("{}", generation.text);
//! ```

pub mod backend;
pub mod error;
pub mod gemini;

pub use backend::{Generation, GenerationRequest, Generator};
pub use error::{LlmError, Result};
pub use gemini::{
    DEFAULT_GEMINI_BASE, DEFAULT_GEMINI_MODEL, GEMINI_API_KEY_ENV, GeminiBackend, GeminiConfig,
};

#[cfg(any(test, feature = "testing"))]
pub use backend::MockGenerator;
