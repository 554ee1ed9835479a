use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rpc_proxy::notification::browser::BrowserNotifier;
use rpc_proxy::notification::{LogNotifier, PendingNotifier};
use rpc_proxy::proxy::upstream::UpstreamClient;
use rpc_proxy::store::PendingStore;
use rpc_proxy::{cli, config, jobs, router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    // Before the subscriber: RUST_LOG and the OTLP endpoint may come from `.env`.
    dotenvy::dotenv().ok();

    // Export spans only when a collector is configured.
    let telemetry_layer = if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic())
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", "rpc-proxy"),
            ])))
            .install_batch(opentelemetry_sdk::runtime::Tokio)?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "rpc_proxy=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry_layer)
        .init();

    let cfg = config::load(cli::Cli::parse())?;

    let result = run_server(cfg).await;
    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(cfg: config::Config) -> anyhow::Result<()> {
    let upstream = UpstreamClient::new(
        cfg.upstream_url.clone(),
        cfg.upstream_timeout,
        cfg.upstream_retries,
    )?;
    let notifier: Arc<dyn PendingNotifier> = if cfg.open_browser {
        Arc::new(BrowserNotifier)
    } else {
        Arc::new(LogNotifier)
    };

    let state = Arc::new(AppState::new(cfg.clone(), Arc::new(upstream), notifier));

    let reaper = jobs::reaper::spawn(
        state.store.clone(),
        cfg.reaper_interval,
        cfg.approval_timeout,
    );
    tracing::info!(
        interval = ?cfg.reaper_interval,
        window = ?cfg.approval_timeout,
        "approval reaper started"
    );

    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind(cfg.listen_addr).await?;
    tracing::info!("rpc-proxy listening on http://{}", cfg.listen_addr);
    tracing::info!(upstream = %cfg.upstream_url, "forwarding read calls");
    tracing::info!(ui = %cfg.ui_base_url, auto_open = cfg.open_browser, "approvals open in the web UI");
    tracing::info!(
        "use http://{} as the RPC URL in Foundry or Hardhat",
        cfg.listen_addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.store.clone()))
        .await?;

    reaper.abort();
    Ok(())
}

/// Resolves on Ctrl-C. Parked callers are released with a timeout error so
/// in-flight connections can drain instead of waiting out their deadline.
async fn shutdown_signal(store: PendingStore) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    let abandoned = store.evict_expired(Duration::ZERO);
    if abandoned > 0 {
        tracing::warn!(abandoned, "shutting down with approvals still pending");
    }
    tracing::info!("shutdown signal received");
}
