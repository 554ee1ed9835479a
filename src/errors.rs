use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::store::ResolveError;

/// Failures reported to the browser UI on the completion surface.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Request not found or expired")]
    PendingNotFound,

    #[error("Request not found or already completed")]
    CompletionNotFound,

    #[error("Request already completed")]
    AlreadyCompleted,

    #[error("invalid completion: {0}")]
    InvalidCompletion(String),
}

impl From<ResolveError> for AppError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::NotFound => AppError::CompletionNotFound,
            ResolveError::AlreadyResolved => AppError::AlreadyCompleted,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::PendingNotFound | AppError::CompletionNotFound => StatusCode::NOT_FOUND,
            AppError::AlreadyCompleted => StatusCode::CONFLICT,
            AppError::InvalidCompletion(_) => StatusCode::BAD_REQUEST,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
