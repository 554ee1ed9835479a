use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::middleware::request_id::request_id;
use crate::proxy::correlator::RpcReply;
use crate::AppState;

/// `POST /` and `POST /rpc`: single calls and batches.
///
/// The body is taken raw so that malformed JSON still gets a JSON-RPC parse
/// error instead of the framework's extractor rejection.
#[tracing::instrument(skip_all, fields(request_id = request_id(&headers)))]
pub async fn rpc_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.correlator.handle_body(&body).await.into_response()
}

impl IntoResponse for RpcReply {
    fn into_response(self) -> Response {
        match self {
            RpcReply::Single(value) => Json(value).into_response(),
            RpcReply::Batch(values) => Json(Value::Array(values)).into_response(),
            RpcReply::Rejected(value) => (StatusCode::BAD_REQUEST, Json(value)).into_response(),
        }
    }
}
