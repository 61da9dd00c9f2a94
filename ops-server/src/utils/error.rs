//! Unified Error Handling
//!
//! Provides the application-wide error type and the JSON envelope error
//! responses are rendered into. Success responses are plain JSON bodies;
//! only failures go through [`AppResponse`].
//!
//! Error code ranges:
//! - E0xxx: general / business errors
//! - E2xxx: permission errors
//! - E3xxx: authentication errors
//! - E9xxx: system errors

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Error envelope returned for every failed request
#[derive(Debug, Serialize)]
pub struct AppResponse {
    pub code: String,
    pub message: String,
}

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Authentication Errors ==========
    #[error("Authentication required")]
    Unauthorized,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Permission denied: {0}")]
    Forbidden(String),

    // ========== Business Logic Errors ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Archived(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    NotArchived(String),

    // ========== System Errors ==========
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    // ========== Convenient constructors ==========

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            // Authentication errors (401)
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "E3001"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "E3002"),
            AppError::TokenExpired => (StatusCode::UNAUTHORIZED, "E3003"),

            // Authorization errors (403)
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "E2001"),

            // Not found (404)
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "E0003"),

            // Conflict (409)
            AppError::Conflict(_) => (StatusCode::CONFLICT, "E0004"),

            // Validation (400)
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "E0002"),

            // Lifecycle policy violations (400)
            AppError::Archived(_) => (StatusCode::BAD_REQUEST, "E0010"),
            AppError::InvalidState(_) => (StatusCode::BAD_REQUEST, "E0011"),
            AppError::NotArchived(_) => (StatusCode::BAD_REQUEST, "E0012"),

            // System errors (500) - log the detail, hide it from the client
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "E9002")
            }
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "E9001")
            }
        };

        let message = match &self {
            AppError::Database(_) => "Database error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = Json(AppResponse {
            code: code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type for HTTP handlers and application logic
pub type AppResult<T> = Result<T, AppError>;
