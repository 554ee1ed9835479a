use std::net::IpAddr;

use clap::Parser;

/// rpc-proxy: local RPC proxy for secure transaction signing via browser wallet
#[derive(Parser, Debug, Clone)]
#[command(name = "rpc-proxy", version, about)]
pub struct Cli {
    /// Upstream RPC URL for read calls
    #[arg(short = 'r', long = "rpc", env = "RPC_PROXY_UPSTREAM")]
    pub rpc: String,

    /// RPC proxy port
    #[arg(short, long, env = "RPC_PROXY_PORT", default_value_t = 8545)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "RPC_PROXY_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Web UI port, used to build approval URLs
    #[arg(long, env = "RPC_PROXY_UI_PORT", default_value_t = 5173)]
    pub ui_port: u16,

    /// Base URL of the web UI (overrides --ui-port)
    #[arg(long, env = "RPC_PROXY_UI_URL")]
    pub ui_url: Option<String>,

    /// Account returned by eth_accounts
    #[arg(long, env = "RPC_PROXY_FROM")]
    pub from: Option<String>,

    /// How long an approval may stay open (e.g. 90s, 5m, 1h)
    #[arg(long, env = "RPC_PROXY_APPROVAL_TIMEOUT", default_value = "5m")]
    pub approval_timeout: String,

    /// How often abandoned approvals are swept
    #[arg(long, env = "RPC_PROXY_REAPER_INTERVAL", default_value = "30s")]
    pub reaper_interval: String,

    /// Per-request timeout for upstream calls
    #[arg(long, env = "RPC_PROXY_UPSTREAM_TIMEOUT", default_value = "30s")]
    pub upstream_timeout: String,

    /// Retries when the upstream node refuses the connection
    #[arg(long, env = "RPC_PROXY_UPSTREAM_RETRIES", default_value_t = 2)]
    pub upstream_retries: u32,

    /// Require approval for wallet_switchEthereumChain and friends
    #[arg(long, env = "RPC_PROXY_INTERCEPT_WALLET_METHODS")]
    pub intercept_wallet_methods: bool,

    /// Disable auto-opening browser for transactions
    #[arg(long = "no-open", env = "RPC_PROXY_NO_OPEN")]
    pub no_open: bool,
}
