use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

pub static REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Tags every exchange with an `x-request-id`, reusing the caller's when it
/// sent a sane one, so a wallet's JSON-RPC reply can be matched to proxy logs.
/// The id is also set on the request for handlers to record in their spans.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let req_id = req
        .headers()
        .get(&REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(str::to_owned)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::debug!(request_id = %req_id, method = %req.method(), path = %req.uri().path(), "request");

    let Ok(val) = HeaderValue::from_str(&req_id) else {
        return next.run(req).await;
    };
    req.headers_mut().insert(REQUEST_ID.clone(), val.clone());

    let mut resp = next.run(req).await;
    resp.headers_mut().insert(REQUEST_ID.clone(), val);
    resp
}

/// The id assigned by [`request_id_middleware`], or `-` outside of it.
pub fn request_id(headers: &axum::http::HeaderMap) -> &str {
    headers
        .get(&REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}
