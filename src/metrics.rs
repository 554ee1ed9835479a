//! Prometheus metrics for the proxy.
//!
//! Exposes a standard `/metrics` endpoint that Prometheus can scrape.
//! Everything lives in the global default registry and is registered lazily
//! on first use, so building several stores or routers (as tests do) is fine.

use once_cell::sync::Lazy;
use prometheus::{
    opts, register_histogram, register_int_counter_vec, register_int_gauge, Encoder, Histogram,
    IntCounterVec, IntGauge, TextEncoder,
};

static CALLS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!("rpc_proxy_calls_total", "JSON-RPC calls handled, by disposition"),
        &["disposition"]
    )
    .expect("failed to register rpc_proxy_calls_total")
});

static APPROVALS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!("rpc_proxy_approvals_total", "Finished approvals, by outcome"),
        &["outcome"]
    )
    .expect("failed to register rpc_proxy_approvals_total")
});

static PENDING_APPROVALS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(opts!(
        "rpc_proxy_pending_approvals",
        "Approval records currently tracked"
    ))
    .expect("failed to register rpc_proxy_pending_approvals")
});

static UPSTREAM_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(prometheus::histogram_opts!(
        "rpc_proxy_upstream_duration_seconds",
        "Upstream round-trip latency in seconds",
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ))
    .expect("failed to register rpc_proxy_upstream_duration_seconds")
});

pub fn record_call(disposition: &str) {
    CALLS_TOTAL.with_label_values(&[disposition]).inc();
}

pub fn record_approval(outcome: &str) {
    APPROVALS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn set_pending(count: usize) {
    PENDING_APPROVALS.set(count as i64);
}

pub fn observe_upstream(seconds: f64) {
    UPSTREAM_DURATION_SECONDS.observe(seconds);
}

/// Encode all registered metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap_or_default();
    String::from_utf8(buffer).unwrap_or_default()
}
