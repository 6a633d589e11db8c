//! Application state shared across handlers.

use std::sync::Arc;

use uiforge_llm::Generator;
use uiforge_session::SessionManager;

use crate::config::ServerConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Session lifecycle over the cache and the durable store.
    pub sessions: Arc<SessionManager>,

    /// Generation provider (None when no API key is configured).
    pub generator: Option<Arc<dyn Generator>>,

    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create a new application state without a generator.
    pub fn new(sessions: SessionManager, config: ServerConfig) -> Self {
        Self {
            sessions: Arc::new(sessions),
            generator: None,
            config: Arc::new(config),
        }
    }

    /// Attach a generation provider.
    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
