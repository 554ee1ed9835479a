use std::sync::Arc;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};

use crate::AppState;

pub mod handlers;

/// Build the completion API router consumed by the browser UI.
/// All routes are relative; the caller mounts this under `/api`.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pending", get(handlers::list_pending))
        .route("/pending/:id", get(handlers::get_pending))
        .route("/complete/:id", post(handlers::complete))
        .route("/config", get(handlers::get_config))
        .fallback(fallback_404)
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}
