use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::service::AuthService;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub fn new(auth_service: Arc<AuthService>) -> Self {
        Self { auth_service }
    }
}

/// Message returned to callers in place of any internal failure detail
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// Error carried through every layer. Each variant records a human-readable
/// message and the tag of the operation that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("incorrect data ({op}): {message}")]
    IncorrectData { message: String, op: &'static str },

    #[error("already exists ({op}): {message}")]
    AlreadyExists { message: String, op: &'static str },

    #[error("not found ({op}): {message}")]
    NotFound { message: String, op: &'static str },

    #[error("unauthorized ({op}): {message}")]
    Unauthorized { message: String, op: &'static str },

    #[error("internal error ({op}): {message}")]
    Internal { message: String, op: &'static str },
}

impl AppError {
    pub fn incorrect_data(message: impl Into<String>, op: &'static str) -> Self {
        AppError::IncorrectData {
            message: message.into(),
            op,
        }
    }

    pub fn already_exists(message: impl Into<String>, op: &'static str) -> Self {
        AppError::AlreadyExists {
            message: message.into(),
            op,
        }
    }

    pub fn not_found(message: impl Into<String>, op: &'static str) -> Self {
        AppError::NotFound {
            message: message.into(),
            op,
        }
    }

    pub fn unauthorized(message: impl Into<String>, op: &'static str) -> Self {
        AppError::Unauthorized {
            message: message.into(),
            op,
        }
    }

    pub fn internal(message: impl Into<String>, op: &'static str) -> Self {
        AppError::Internal {
            message: message.into(),
            op,
        }
    }

    /// Stable machine-readable code sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            AppError::IncorrectData { .. } => "incorrect_data",
            AppError::AlreadyExists { .. } => "user_already_exists",
            AppError::NotFound { .. } => "user_not_found",
            AppError::Unauthorized { .. } => "unauthorized",
            AppError::Internal { .. } => "internal",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::IncorrectData { message, .. }
            | AppError::AlreadyExists { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Unauthorized { message, .. }
            | AppError::Internal { message, .. } => message,
        }
    }

    pub fn op(&self) -> &'static str {
        match self {
            AppError::IncorrectData { op, .. }
            | AppError::AlreadyExists { op, .. }
            | AppError::NotFound { op, .. }
            | AppError::Unauthorized { op, .. }
            | AppError::Internal { op, .. } => op,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::IncorrectData { .. } => StatusCode::BAD_REQUEST,
            AppError::AlreadyExists { .. } => StatusCode::CONFLICT,
            AppError::NotFound { .. } | AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            AppError::Internal { message, op } => {
                error!(code = self.code(), op = %op, detail = %message, "Request failed");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            other => {
                warn!(
                    code = other.code(),
                    op = %other.op(),
                    reason = %other.message(),
                    "Request rejected"
                );
                other.message().to_string()
            }
        };

        let body = Json(json!({
            "code": self.code(),
            "message": message,
        }));

        (status, body).into_response()
    }
}
