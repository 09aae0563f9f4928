use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    /// Duplicate content at admission. Rendered as the 409 body the queue
    /// clients expect: `{"alreadyExists": true, "message": ...}`.
    Duplicate(String),
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::Duplicate(msg) => write!(f, "Duplicate: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                axum::Json(json!({ "error": msg })),
            )
                .into_response(),
            AppError::Duplicate(msg) => (
                StatusCode::CONFLICT,
                axum::Json(json!({ "alreadyExists": true, "message": msg })),
            )
                .into_response(),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    axum::Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
