// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Field-keyed validation errors, serialized as a bare JSON object:
/// `{"name": ["Обязательное поле."], ...}`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Single-field validation error.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        ApiError::Validation(errors)
    }
}

/// JSON error response body for non-field errors
#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

fn detail(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            detail: message.to_string(),
        }),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => detail(
                StatusCode::UNAUTHORIZED,
                "Учетные данные не были предоставлены.",
            ),
            ApiError::InvalidToken => {
                detail(StatusCode::UNAUTHORIZED, "Недопустимый токен.")
            }
            ApiError::PermissionDenied => detail(
                StatusCode::FORBIDDEN,
                "У вас недостаточно прав для выполнения данного действия.",
            ),
            ApiError::NotFound(msg) => detail(StatusCode::NOT_FOUND, &msg),
            ApiError::BadRequest(msg) => detail(StatusCode::BAD_REQUEST, &msg),
            ApiError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            ApiError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                detail(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Произошла неизвестная ошибка.",
                )
            }
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                detail(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Произошла неизвестная ошибка.",
                )
            }
        }
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, ApiError>;
