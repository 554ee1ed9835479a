//! Turns an inbound JSON-RPC body into the reply the caller receives.
//!
//! Each call is classified, then answered locally, forwarded upstream, or
//! parked in the [`PendingStore`] until the browser reports an outcome.
//! Batch members run concurrently; replies keep the request order.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::Value;
use uuid::Uuid;

use crate::metrics;
use crate::models::approval::ApprovalOutcome;
use crate::models::rpc::{
    JsonRpcRequest, JsonRpcResponse, RpcCall, RpcPayload, APPROVAL_TIMEOUT, INTERNAL_ERROR,
    USER_REJECTED,
};
use crate::notification::PendingNotifier;
use crate::proxy::classifier::{Disposition, MethodClassifier};
use crate::proxy::upstream::Forwarder;
use crate::store::{PendingStore, WaitError};

pub const APPROVAL_TIMEOUT_MESSAGE: &str = "Approval timed out: the request was not completed in time";

/// What goes back to the HTTP caller.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcReply {
    Single(Value),
    Batch(Vec<Value>),
    /// The body was not a call or batch of calls; nothing was executed.
    Rejected(Value),
}

pub struct RequestCorrelator {
    classifier: MethodClassifier,
    store: PendingStore,
    upstream: Arc<dyn Forwarder>,
    notifier: Arc<dyn PendingNotifier>,
    approval_base_url: String,
    approval_timeout: Duration,
}

impl RequestCorrelator {
    pub fn new(
        classifier: MethodClassifier,
        store: PendingStore,
        upstream: Arc<dyn Forwarder>,
        notifier: Arc<dyn PendingNotifier>,
        approval_base_url: impl Into<String>,
        approval_timeout: Duration,
    ) -> Self {
        Self {
            classifier,
            store,
            upstream,
            notifier,
            approval_base_url: approval_base_url.into().trim_end_matches('/').to_string(),
            approval_timeout,
        }
    }

    pub fn approval_url(&self, id: &Uuid) -> String {
        format!("{}/request/{}", self.approval_base_url, id)
    }

    pub async fn handle_body(&self, body: &[u8]) -> RpcReply {
        match RpcPayload::parse(body) {
            Ok(RpcPayload::Single(call)) => {
                tracing::debug!(method = %call.request.method, "rpc");
                RpcReply::Single(self.handle_call(call).await)
            }
            Ok(RpcPayload::Batch(calls)) => {
                let methods: Vec<&str> = calls.iter().map(|c| c.request.method.as_str()).collect();
                tracing::debug!(size = calls.len(), methods = %methods.join(", "), "rpc batch");
                let replies = join_all(calls.into_iter().map(|call| self.handle_call(call))).await;
                RpcReply::Batch(replies)
            }
            Err(e) => {
                tracing::warn!(error = %e, "rejecting malformed rpc payload");
                RpcReply::Rejected(JsonRpcResponse::error(Value::Null, e.code(), e.to_string()).into())
            }
        }
    }

    pub async fn handle_call(&self, call: RpcCall) -> Value {
        let disposition = self.classifier.classify(&call.request.method);
        metrics::record_call(disposition.as_str());

        match disposition {
            Disposition::Local(local) => {
                JsonRpcResponse::success(call.request.id, self.classifier.resolve_local(local)).into()
            }
            Disposition::PassThrough => self.upstream.forward(&call.raw).await,
            Disposition::Intercepted => self.intercept(call.request).await.into(),
        }
    }

    async fn intercept(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let JsonRpcRequest {
            id: rpc_id,
            method,
            params,
            ..
        } = request;

        let id = self.store.create(method.clone(), params);
        let url = self.approval_url(&id);
        tracing::info!(%id, %method, "awaiting approval");
        self.notifier.notify(&id, &url);

        match self.store.await_resolution(&id, self.approval_timeout).await {
            Ok(ApprovalOutcome::Success(value)) => {
                tracing::info!(%id, %method, "approval completed");
                metrics::record_approval("success");
                JsonRpcResponse::success(rpc_id, Value::String(value))
            }
            Ok(ApprovalOutcome::Failure(message)) => {
                tracing::warn!(%id, %method, reason = %message, "approval rejected");
                metrics::record_approval("rejected");
                JsonRpcResponse::error(rpc_id, USER_REJECTED, message)
            }
            Err(WaitError::TimedOut) | Err(WaitError::Expired) => {
                tracing::warn!(%id, %method, "approval timed out");
                metrics::record_approval("timeout");
                JsonRpcResponse::error(rpc_id, APPROVAL_TIMEOUT, APPROVAL_TIMEOUT_MESSAGE)
            }
            Err(e) => {
                tracing::error!(%id, %method, error = %e, "approval wait failed");
                metrics::record_approval("error");
                JsonRpcResponse::error(rpc_id, INTERNAL_ERROR, e.to_string())
            }
        }
    }
}
