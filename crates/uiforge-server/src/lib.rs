//! HTTP API server for uiforge.
//!
//! Exposes session persistence and component generation over JSON.
//!
//! # Features
//!
//! - Session list/create/get/update/delete scoped to the authenticated user
//! - Generation proxy endpoint
//! - Bearer-token, trusted-proxy or local-mode authentication
//! - Request logging and CORS
//!
//! # Example
//!
//! ```ignore
//! use uiforge_server::{AppState, Server, ServerConfig};
//!
//! let config = ServerConfig::new()
//!     .with_token("alice", "secret-token")
//!     .with_bind_address("127.0.0.1:8080".parse()?);
//!
//! let server = Server::new(AppState::new(session_manager, config));
//! server.run().await?;
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;

pub use auth::{AuthError, Identity, auth_middleware};
pub use config::{ApiToken, ServerConfig};
pub use error::{ErrorResponse, Result, ServerError};
pub use logging::request_logging_middleware;
pub use state::AppState;

use std::future::Future;
use std::net::SocketAddr;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{Router, middleware};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// The uiforge HTTP server.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a server from application state.
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(routes::health_routes())
            .nest("/api/v1", self.api_routes())
            .layer(DefaultBodyLimit::max(self.state.config.max_body_size))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                logging::request_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone());

        if let Some(cors) = self.cors_layer() {
            router = router.layer(cors);
        }

        router
    }

    /// API routes (v1). All of them require authentication.
    fn api_routes(&self) -> Router<AppState> {
        use axum::routing::{get, post};

        Router::new()
            .route("/me", get(routes::whoami_handler))
            .route("/sessions", get(routes::list_sessions_handler))
            .route("/sessions/new", post(routes::create_session_handler))
            .route(
                "/sessions/{id}",
                get(routes::get_session_handler)
                    .put(routes::update_session_handler)
                    .delete(routes::delete_session_handler),
            )
            .route("/generate", post(routes::generate_handler))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                auth::auth_middleware,
            ))
    }

    fn cors_layer(&self) -> Option<CorsLayer> {
        let origins: Vec<HeaderValue> = self
            .state
            .config
            .cors_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        if origins.is_empty() {
            return None;
        }

        Some(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
    }

    /// Run the server on the configured address until the process exits.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server on the configured address until `shutdown` resolves.
    pub async fn run_until(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let addr = self.state.config.bind_address;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind {}: {}", addr, e)))?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener (useful for testing).
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let addr = listener
            .local_addr()
            .map_err(|e| ServerError::Internal(format!("Failed to read local address: {}", e)))?;
        let router = self.router();

        info!(%addr, auth = self.auth_mode(), "Starting server");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        info!("Server stopped");
        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }

    fn auth_mode(&self) -> &'static str {
        let config = &self.state.config;
        match (config.api_tokens.is_empty(), config.proxy_header.is_some()) {
            (true, false) => "local",
            (false, false) => "token",
            (true, true) => "proxy",
            (false, true) => "token+proxy",
        }
    }
}
