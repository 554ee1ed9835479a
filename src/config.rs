use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::cli::Cli;

static ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("address regex is valid"));

pub const DEFAULT_APPROVAL_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_REAPER_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct Config {
    pub upstream_url: String,
    pub listen_addr: SocketAddr,
    /// Base of the approval page URLs handed to the notifier.
    pub ui_base_url: String,
    pub from_address: Option<String>,
    /// Expiry window for pending approvals; also the caller's wait deadline.
    pub approval_timeout: Duration,
    pub reaper_interval: Duration,
    pub upstream_timeout: Duration,
    pub upstream_retries: u32,
    pub intercept_wallet_methods: bool,
    pub open_browser: bool,
}

impl Config {
    /// Defaults matching the CLI, pointed at `upstream_url`.
    pub fn new(upstream_url: impl Into<String>) -> Self {
        Self {
            upstream_url: upstream_url.into(),
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8545),
            ui_base_url: "http://localhost:5173".into(),
            from_address: None,
            approval_timeout: DEFAULT_APPROVAL_TIMEOUT,
            reaper_interval: DEFAULT_REAPER_INTERVAL,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            upstream_retries: 2,
            intercept_wallet_methods: false,
            open_browser: true,
        }
    }
}

/// Validate parsed flags into a [`Config`].
/// Call `dotenvy::dotenv()` before parsing so `.env` values act as flag fallbacks.
pub fn load(cli: Cli) -> anyhow::Result<Config> {
    let upstream = url::Url::parse(&cli.rpc).context("invalid --rpc URL")?;
    if !matches!(upstream.scheme(), "http" | "https") {
        anyhow::bail!("--rpc must be an http(s) URL, got scheme '{}'", upstream.scheme());
    }

    let ui_base_url = match cli.ui_url {
        Some(raw) => {
            let parsed = url::Url::parse(&raw).context("invalid --ui-url")?;
            parsed.as_str().trim_end_matches('/').to_string()
        }
        None => format!("http://localhost:{}", cli.ui_port),
    };

    let from_address = match cli.from {
        Some(addr) if !is_valid_address(&addr) => {
            anyhow::bail!("--from must be a 0x-prefixed 20-byte hex address, got '{}'", addr)
        }
        other => other,
    };

    let approval_timeout = parse_duration(&cli.approval_timeout)
        .with_context(|| format!("invalid --approval-timeout '{}'", cli.approval_timeout))?;
    let reaper_interval = parse_duration(&cli.reaper_interval)
        .with_context(|| format!("invalid --reaper-interval '{}'", cli.reaper_interval))?;
    let upstream_timeout = parse_duration(&cli.upstream_timeout)
        .with_context(|| format!("invalid --upstream-timeout '{}'", cli.upstream_timeout))?;

    Ok(Config {
        // Keep the operator's spelling; Url::parse would append a trailing slash.
        upstream_url: cli.rpc,
        listen_addr: SocketAddr::new(cli.host, cli.port),
        ui_base_url,
        from_address,
        approval_timeout,
        reaper_interval,
        upstream_timeout,
        upstream_retries: cli.upstream_retries,
        intercept_wallet_methods: cli.intercept_wallet_methods,
        open_browser: !cli.no_open,
    })
}

pub fn is_valid_address(addr: &str) -> bool {
    ADDRESS_RE.is_match(addr)
}

/// Parse `"250ms"`, `"30s"`, `"5m"`, `"1h"` (a bare number means seconds).
/// Zero is rejected: every wait must have a real deadline.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (num_str, unit) = raw.split_at(split);
    let num: u64 = num_str.parse().ok()?;

    let duration = match unit {
        "ms" => Duration::from_millis(num),
        "" | "s" => Duration::from_secs(num),
        "m" => Duration::from_secs(num.checked_mul(60)?),
        "h" => Duration::from_secs(num.checked_mul(3600)?),
        _ => return None,
    };

    (!duration.is_zero()).then_some(duration)
}
