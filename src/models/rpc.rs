//! JSON-RPC 2.0 envelope types and inbound payload parsing.
//!
//! Pass-through calls keep their raw JSON so they can be forwarded verbatim;
//! everything else is answered with a locally built [`JsonRpcResponse`].

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

// ── Error codes ───────────────────────────────────────────────

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const INTERNAL_ERROR: i64 = -32603;
/// Server-error range: the upstream node could not be reached or answered garbage.
pub const UPSTREAM_ERROR: i64 = -32000;
/// Server-error range: nobody completed the approval before the deadline.
pub const APPROVAL_TIMEOUT: i64 = -32001;
/// EIP-1193 "User Rejected Request".
pub const USER_REJECTED: i64 = 4001;

// ── Envelopes ─────────────────────────────────────────────────

/// Typed view of one call. The `jsonrpc` member is not checked.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsonRpcResponse {
    Success { id: Value, result: Value },
    Failure { id: Value, error: JsonRpcError },
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self::Success { id, result }
    }

    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self::Failure {
            id,
            error: JsonRpcError {
                code,
                message: message.into(),
            },
        }
    }
}

impl From<JsonRpcResponse> for Value {
    fn from(resp: JsonRpcResponse) -> Self {
        match resp {
            JsonRpcResponse::Success { id, result } => json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": result,
            }),
            JsonRpcResponse::Failure { id, error } => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": error.code, "message": error.message },
            }),
        }
    }
}

// ── Inbound payloads ──────────────────────────────────────────

/// A single call as received: the typed view plus the untouched JSON.
#[derive(Debug, Clone)]
pub struct RpcCall {
    pub request: JsonRpcRequest,
    pub raw: Value,
}

impl RpcCall {
    fn from_value(raw: Value) -> Result<Self, PayloadError> {
        if !raw.is_object() {
            return Err(PayloadError::Parse);
        }
        let request = JsonRpcRequest::deserialize(&raw).map_err(|_| PayloadError::Parse)?;
        Ok(Self { request, raw })
    }
}

#[derive(Debug, Clone)]
pub enum RpcPayload {
    Single(RpcCall),
    Batch(Vec<RpcCall>),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Parse error")]
    Parse,
    #[error("Invalid Request: empty batch")]
    EmptyBatch,
}

impl PayloadError {
    pub fn code(&self) -> i64 {
        match self {
            PayloadError::Parse => PARSE_ERROR,
            PayloadError::EmptyBatch => INVALID_REQUEST,
        }
    }
}

impl RpcPayload {
    /// Parse a request body. A body that is not a call object or a non-empty
    /// array of call objects is rejected as a whole, never partially.
    pub fn parse(body: &[u8]) -> Result<Self, PayloadError> {
        let value: Value = serde_json::from_slice(body).map_err(|_| PayloadError::Parse)?;
        match value {
            Value::Array(items) => {
                if items.is_empty() {
                    return Err(PayloadError::EmptyBatch);
                }
                items
                    .into_iter()
                    .map(RpcCall::from_value)
                    .collect::<Result<Vec<_>, _>>()
                    .map(RpcPayload::Batch)
            }
            other => RpcCall::from_value(other).map(RpcPayload::Single),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_call() {
        let body = br#"{"jsonrpc":"2.0","id":7,"method":"eth_chainId","params":[]}"#;
        match RpcPayload::parse(body).unwrap() {
            RpcPayload::Single(call) => {
                assert_eq!(call.request.method, "eth_chainId");
                assert_eq!(call.request.id, json!(7));
                assert_eq!(call.raw["params"], json!([]));
            }
            other => panic!("expected single call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_batch_keeps_order() {
        let body = br#"[{"jsonrpc":"2.0","id":1,"method":"a"},{"jsonrpc":"2.0","id":2,"method":"b"}]"#;
        match RpcPayload::parse(body).unwrap() {
            RpcPayload::Batch(calls) => {
                let methods: Vec<_> = calls.iter().map(|c| c.request.method.as_str()).collect();
                assert_eq!(methods, vec!["a", "b"]);
            }
            other => panic!("expected batch, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = RpcPayload::parse(b"{not json").unwrap_err();
        assert_eq!(err, PayloadError::Parse);
        assert_eq!(err.code(), PARSE_ERROR);
    }

    #[test]
    fn test_scalar_body_is_parse_error() {
        assert_eq!(RpcPayload::parse(b"42").unwrap_err(), PayloadError::Parse);
        assert_eq!(RpcPayload::parse(b"\"eth_chainId\"").unwrap_err(), PayloadError::Parse);
    }

    #[test]
    fn test_batch_with_bad_member_rejected_wholesale() {
        let body = br#"[{"jsonrpc":"2.0","id":1,"method":"eth_chainId"}, 5]"#;
        assert_eq!(RpcPayload::parse(body).unwrap_err(), PayloadError::Parse);

        let missing_method = br#"[{"jsonrpc":"2.0","id":1,"method":"eth_chainId"}, {"id":2}]"#;
        assert_eq!(RpcPayload::parse(missing_method).unwrap_err(), PayloadError::Parse);
    }

    #[test]
    fn test_empty_batch_is_invalid_request() {
        let err = RpcPayload::parse(b"[]").unwrap_err();
        assert_eq!(err.code(), INVALID_REQUEST);
    }

    #[test]
    fn test_missing_id_defaults_to_null() {
        match RpcPayload::parse(br#"{"method":"eth_blockNumber"}"#).unwrap() {
            RpcPayload::Single(call) => {
                assert_eq!(call.request.id, Value::Null);
                assert_eq!(call.request.params, Value::Null);
            }
            other => panic!("expected single call, got {:?}", other),
        }
    }

    #[test]
    fn test_error_response_shape() {
        let value: Value = JsonRpcResponse::error(json!("abc"), USER_REJECTED, "user rejected").into();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], "abc");
        assert_eq!(value["error"]["code"], 4001);
        assert_eq!(value["error"]["message"], "user rejected");
        assert!(value.get("result").is_none());
        assert!(value["error"].get("data").is_none());
    }

    #[test]
    fn test_success_response_keeps_null_result() {
        let value: Value = JsonRpcResponse::success(json!(1), Value::Null).into();
        assert!(value.get("result").is_some());
        assert!(value.get("error").is_none());
    }
}
