//! API routes.

pub mod generate;
pub mod health;
pub mod sessions;

pub use generate::{GenerateRequest, GenerateResponse, generate_handler};
pub use health::{HealthResponse, WhoAmIResponse, health_routes, whoami_handler};
pub use sessions::{
    DeleteSessionResponse, ListSessionsResponse, SessionResponse, create_session_handler,
    delete_session_handler, get_session_handler, list_sessions_handler, update_session_handler,
};
