// Library crate for the gatekeeper authentication server
// This file exposes the public API for integration tests

pub mod auth;
pub mod config;
pub mod shared;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

// Re-export commonly used types for easier access in tests
pub use auth::{
    hasher::CredentialHasher,
    repository::{CredentialStore, InMemoryCredentialStore, PostgresCredentialStore},
    service::AuthService,
    token::TokenIssuer,
};
pub use config::AppConfig;
pub use shared::{AppError, AppState};

/// Full application router with request tracing
pub fn create_app(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .merge(auth::router(app_state))
        .layer(TraceLayer::new_for_http())
}
