/// HTTP client for relaying JSON-RPC calls to the upstream node.
/// Uses reqwest-middleware for retries. Only connect failures are retried;
/// once a call has reached the node, its first answer is the one relayed.
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
    policies::ExponentialBackoff, RetryTransientMiddleware, Retryable, RetryableStrategy,
};
use serde_json::Value;
use thiserror::Error;

use crate::metrics;
use crate::models::rpc::{JsonRpcResponse, UPSTREAM_ERROR};

/// Something that can answer a JSON-RPC call (or batch array) on our behalf.
///
/// Implementations never fail: transport problems come back as JSON-RPC
/// error envelopes addressed to the caller's id.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, payload: &Value) -> Value;
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{0}")]
    Transport(String),
    #[error("upstream returned HTTP {status} with a non-JSON body")]
    BadStatus { status: u16 },
    #[error("invalid upstream response: {0}")]
    InvalidBody(String),
}

/// Retry only when the connection could not be established.
///
/// Anything after that (a status code, a body, a read timeout) means the node
/// may have acted on the call.
pub struct ConnectFailuresOnly;

impl RetryableStrategy for ConnectFailuresOnly {
    fn handle(
        &self,
        res: &Result<reqwest::Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match res {
            Ok(_) => None,
            Err(reqwest_middleware::Error::Reqwest(e)) if e.is_connect() => {
                Some(Retryable::Transient)
            }
            Err(_) => Some(Retryable::Fatal),
        }
    }
}

pub struct UpstreamClient {
    client: ClientWithMiddleware,
    url: String,
}

impl UpstreamClient {
    pub fn new(url: impl Into<String>, timeout: Duration, max_retries: u32) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .use_rustls_tls()
            .pool_max_idle_per_host(32)
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(100), Duration::from_secs(2))
            .build_with_max_retries(max_retries);

        let client = ClientBuilder::new(reqwest_client)
            .with(RetryTransientMiddleware::new_with_policy_and_strategy(
                retry_policy,
                ConnectFailuresOnly,
            ))
            .build();

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn send(&self, payload: &Value) -> Result<Value, UpstreamError> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| UpstreamError::InvalidBody(e.to_string()))?;

        let resp = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        // Nodes often answer JSON-RPC errors with a non-2xx status; the body is still the answer.
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => Ok(value),
            Err(_) if !status.is_success() => Err(UpstreamError::BadStatus {
                status: status.as_u16(),
            }),
            Err(e) => Err(UpstreamError::InvalidBody(e.to_string())),
        }
    }
}

#[async_trait]
impl Forwarder for UpstreamClient {
    async fn forward(&self, payload: &Value) -> Value {
        let start = Instant::now();
        let result = self.send(payload).await;
        metrics::observe_upstream(start.elapsed().as_secs_f64());

        match result {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(upstream = %self.url, error = %e, "upstream request failed");
                failure_envelope(payload, &format!("Upstream request failed: {}", e))
            }
        }
    }
}

/// Error reply matching the shape of `payload`: one envelope per call.
pub fn failure_envelope(payload: &Value, message: &str) -> Value {
    match payload {
        Value::Array(calls) => Value::Array(
            calls
                .iter()
                .map(|call| failure_envelope(call, message))
                .collect(),
        ),
        call => {
            let id = call.get("id").cloned().unwrap_or(Value::Null);
            JsonRpcResponse::error(id, UPSTREAM_ERROR, message).into()
        }
    }
}
