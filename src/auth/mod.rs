// Public API - what other modules can use
pub use handlers::{login, logout, me, register};
pub use middleware::bearer_auth;
pub use types::{AccessClaims, Gender, Role};

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::shared::AppState;

pub mod cleanup_task;
mod cookie;
mod handlers;
pub mod hasher;
mod middleware;
pub mod models;
pub mod repository;
pub mod service;
pub mod token;
pub mod types;
mod validation;

/// Routes for registration, login and the bearer-protected endpoints
pub fn router(app_state: AppState) -> Router {
    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route_layer(from_fn_with_state(app_state.clone(), bearer_auth));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
        .with_state(app_state)
}
