//! rpc-proxy library crate.
//!
//! A local JSON-RPC proxy: read calls go straight to the upstream node,
//! signing calls are parked until a human approves them in a browser wallet.
//! Exposes the modules and router used by the binary and by `tests/`.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod notification;
pub mod proxy;
pub mod store;

use config::Config;
use notification::PendingNotifier;
use proxy::classifier::MethodClassifier;
use proxy::correlator::RequestCorrelator;
use proxy::upstream::Forwarder;
use store::PendingStore;

/// Shared application state passed to handlers.
pub struct AppState {
    pub config: Config,
    pub store: PendingStore,
    pub correlator: RequestCorrelator,
}

impl AppState {
    pub fn new(
        config: Config,
        upstream: Arc<dyn Forwarder>,
        notifier: Arc<dyn PendingNotifier>,
    ) -> Self {
        let store = PendingStore::new();
        let classifier =
            MethodClassifier::new(config.from_address.clone(), config.intercept_wallet_methods);
        let correlator = RequestCorrelator::new(
            classifier,
            store.clone(),
            upstream,
            notifier,
            config.ui_base_url.clone(),
            config.approval_timeout,
        );
        Self {
            config,
            store,
            correlator,
        }
    }
}

/// Full HTTP surface: JSON-RPC endpoint, completion API, health and metrics.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(proxy::handler::rpc_handler))
        .route("/rpc", post(proxy::handler::rpc_handler))
        .route("/health", get(|| async { Json(json!({ "ok": true })) }))
        .route("/metrics", get(|| async { metrics::encode_metrics() }))
        .nest("/api", api::api_router())
        .with_state(state)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        // The wallet UI is served from its own port on the same machine.
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::predicate(|origin, _| {
                    let origin_str = origin.to_str().unwrap_or("");
                    origin_str.starts_with("http://localhost:")
                        || origin_str.starts_with("http://127.0.0.1:")
                        || origin_str == "http://localhost"
                        || origin_str == "http://127.0.0.1"
                }))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    HeaderName::from_static("content-type"),
                    HeaderName::from_static("x-request-id"),
                ]),
        )
        .layer(axum::middleware::from_fn(
            middleware::request_id::request_id_middleware,
        ))
}
