//! Upstream forwarder against a mock node.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rpc_proxy::models::rpc::UPSTREAM_ERROR;
use rpc_proxy::proxy::upstream::{Forwarder, UpstreamClient};

#[tokio::test]
async fn test_forwards_call_verbatim() {
    let server = MockServer::start().await;
    let call = json!({"jsonrpc": "2.0", "id": 1, "method": "eth_getBalance", "params": ["0xabc", "latest"], "x-extra": true});

    Mock::given(method("POST"))
        .and(header("content-type", "application/json"))
        .and(body_json(call.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": "0x0"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = UpstreamClient::new(server.uri(), Duration::from_secs(5), 0).unwrap();
    let reply = client.forward(&call).await;
    assert_eq!(reply, json!({"jsonrpc": "2.0", "id": 1, "result": "0x0"}));
}

#[tokio::test]
async fn test_json_error_body_on_http_error_is_passed_through() {
    let server = MockServer::start().await;
    let node_error = json!({"jsonrpc": "2.0", "id": 2, "error": {"code": -32005, "message": "rate limited"}});
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(node_error.clone()))
        .mount(&server)
        .await;

    let client = UpstreamClient::new(server.uri(), Duration::from_secs(5), 0).unwrap();
    let reply = client
        .forward(&json!({"jsonrpc": "2.0", "id": 2, "method": "eth_call", "params": []}))
        .await;
    assert_eq!(reply, node_error);
}

#[tokio::test]
async fn test_non_json_body_becomes_rpc_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let client = UpstreamClient::new(server.uri(), Duration::from_secs(5), 0).unwrap();
    let reply = client
        .forward(&json!({"jsonrpc": "2.0", "id": "x", "method": "eth_chainId"}))
        .await;
    assert_eq!(reply["id"], "x");
    assert_eq!(reply["error"]["code"], UPSTREAM_ERROR);
    assert!(reply["error"]["message"].as_str().unwrap().contains("502"));
}

#[tokio::test]
async fn test_slow_upstream_is_bounded_by_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": "0x1"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = UpstreamClient::new(server.uri(), Duration::from_millis(200), 0).unwrap();
    let started = std::time::Instant::now();
    let reply = client
        .forward(&json!({"jsonrpc": "2.0", "id": 1, "method": "eth_blockNumber"}))
        .await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(reply["error"]["code"], UPSTREAM_ERROR);
    assert_eq!(reply["id"], 1);
}

#[tokio::test]
async fn test_forwards_batch_array() {
    let server = MockServer::start().await;
    let batch = json!([
        {"jsonrpc": "2.0", "id": 1, "method": "eth_chainId"},
        {"jsonrpc": "2.0", "id": 2, "method": "eth_blockNumber"}
    ]);
    let replies = json!([
        {"jsonrpc": "2.0", "id": 1, "result": "0x1"},
        {"jsonrpc": "2.0", "id": 2, "result": "0x10"}
    ]);
    Mock::given(method("POST"))
        .and(body_json(batch.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(replies.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let client = UpstreamClient::new(server.uri(), Duration::from_secs(5), 0).unwrap();
    assert_eq!(client.forward(&batch).await, replies);
}

#[tokio::test]
async fn test_unreachable_batch_gets_one_error_per_call() {
    let client = UpstreamClient::new("http://127.0.0.1:1", Duration::from_secs(2), 0).unwrap();
    let reply = client
        .forward(&json!([
            {"jsonrpc": "2.0", "id": 1, "method": "eth_chainId"},
            {"jsonrpc": "2.0", "id": 2, "method": "eth_blockNumber"}
        ]))
        .await;

    let items = reply.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], 1);
    assert_eq!(items[1]["id"], 2);
    assert!(items.iter().all(|i| i["error"]["code"] == UPSTREAM_ERROR));
}

// ── Retry behaviour ──────────────────────────────────────────

#[tokio::test]
async fn test_server_error_with_json_body_is_final() {
    let server = MockServer::start().await;
    let busy = json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32000, "message": "busy"}});
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(busy.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let client = UpstreamClient::new(server.uri(), Duration::from_secs(30), 2).unwrap();
    let reply = client
        .forward(&json!({"jsonrpc": "2.0", "id": 1, "method": "eth_sendRawTransaction", "params": ["0xf86c"]}))
        .await;
    assert_eq!(reply, busy);
}

#[tokio::test]
async fn test_first_answer_is_relayed_not_a_retry() {
    let server = MockServer::start().await;
    let accepted = json!({"jsonrpc": "2.0", "id": 1, "result": "0xabc"});
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream hiccup"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(accepted))
        .expect(0)
        .mount(&server)
        .await;

    let client = UpstreamClient::new(server.uri(), Duration::from_secs(30), 2).unwrap();
    let reply = client
        .forward(&json!({"jsonrpc": "2.0", "id": 1, "method": "eth_sendRawTransaction", "params": ["0xf86c"]}))
        .await;
    assert_eq!(reply["error"]["code"], UPSTREAM_ERROR);
    assert!(reply["error"]["message"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn test_timeout_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": "0x1"}))
                .set_delay(Duration::from_secs(5)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = UpstreamClient::new(server.uri(), Duration::from_millis(300), 2).unwrap();
    let started = std::time::Instant::now();
    let reply = client
        .forward(&json!({"jsonrpc": "2.0", "id": 1, "method": "eth_newFilter", "params": [{}]}))
        .await;

    assert!(started.elapsed() < Duration::from_millis(1500));
    assert_eq!(reply["error"]["code"], UPSTREAM_ERROR);
}

#[tokio::test]
async fn test_refused_connection_retries_then_reports() {
    let client = UpstreamClient::new("http://127.0.0.1:1", Duration::from_secs(2), 2).unwrap();
    let started = std::time::Instant::now();
    let reply = client
        .forward(&json!({"jsonrpc": "2.0", "id": 3, "method": "eth_chainId"}))
        .await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(reply["id"], 3);
    assert_eq!(reply["error"]["code"], UPSTREAM_ERROR);
}
