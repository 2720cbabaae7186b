//! Error handling

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::info;

/// Errors surfaced by the comic service.
///
/// Most failures inside the pipeline are absorbed into fallbacks, so these
/// are mostly about bad input and the few local writes that can't be avoided.
#[derive(Debug)]
pub enum ComicError {
    /// When you didn't do the right thing
    BadRequest(String),
    /// When a requested resource is not found
    NotFound(String),
    /// When an internal server error occurs
    InternalServerError(String),
}

impl std::fmt::Display for ComicError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComicError::BadRequest(message) => write!(f, "bad request: {message}"),
            ComicError::NotFound(what) => write!(f, "not found: {what}"),
            ComicError::InternalServerError(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl std::error::Error for ComicError {}

impl From<std::io::Error> for ComicError {
    fn from(err: std::io::Error) -> Self {
        ComicError::InternalServerError(err.to_string())
    }
}

impl From<image::ImageError> for ComicError {
    fn from(err: image::ImageError) -> Self {
        ComicError::InternalServerError(err.to_string())
    }
}

impl From<axum::http::Error> for ComicError {
    fn from(err: axum::http::Error) -> Self {
        ComicError::InternalServerError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ComicError {
    fn from(err: tokio::task::JoinError) -> Self {
        ComicError::InternalServerError(format!("background task failed: {err}"))
    }
}

impl From<axum::extract::rejection::JsonRejection> for ComicError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        ComicError::BadRequest(err.body_text())
    }
}

impl IntoResponse for ComicError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ComicError::BadRequest(message) => {
                info!("Bad request received: {}", message);
                (StatusCode::BAD_REQUEST, message)
            }
            ComicError::NotFound(what) => {
                tracing::error!("404 {what}");
                (StatusCode::NOT_FOUND, "Not Found".to_string())
            }
            ComicError::InternalServerError(message) => {
                tracing::error!("Internal server error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({"success": false, "error": message}))).into_response()
    }
}
