//! Decides, per method name, how a JSON-RPC call is served.
//!
//! The mapping is a lookup table built once from configuration. Anything not
//! in the table is forwarded, so the upstream node gets to say
//! "method not found" instead of the proxy guessing.

use std::collections::HashMap;

use serde_json::{json, Value};

/// Methods that need a signature over caller-supplied data.
pub const SIGNING_METHODS: &[&str] = &[
    "eth_sendTransaction",
    "eth_signTransaction",
    "eth_sign",
    "personal_sign",
    "eth_signTypedData",
    "eth_signTypedData_v1",
    "eth_signTypedData_v3",
    "eth_signTypedData_v4",
];

/// Wallet-state methods, intercepted only when configured to.
pub const WALLET_METHODS: &[&str] = &[
    "wallet_switchEthereumChain",
    "wallet_addEthereumChain",
    "wallet_watchAsset",
];

pub const ACCOUNT_METHODS: &[&str] = &["eth_accounts", "eth_requestAccounts"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalMethod {
    Accounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Local(LocalMethod),
    Intercepted,
    PassThrough,
}

impl Disposition {
    /// Label used for metrics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Local(_) => "local",
            Disposition::Intercepted => "intercepted",
            Disposition::PassThrough => "passthrough",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MethodClassifier {
    table: HashMap<&'static str, Disposition>,
    accounts: Vec<String>,
}

impl MethodClassifier {
    pub fn new(from_address: Option<String>, intercept_wallet_methods: bool) -> Self {
        let mut table = HashMap::new();
        for &method in ACCOUNT_METHODS {
            table.insert(method, Disposition::Local(LocalMethod::Accounts));
        }
        for &method in SIGNING_METHODS {
            table.insert(method, Disposition::Intercepted);
        }
        if intercept_wallet_methods {
            for &method in WALLET_METHODS {
                table.insert(method, Disposition::Intercepted);
            }
        }

        Self {
            table,
            accounts: from_address.into_iter().collect(),
        }
    }

    pub fn classify(&self, method: &str) -> Disposition {
        self.table
            .get(method)
            .copied()
            .unwrap_or(Disposition::PassThrough)
    }

    /// Result for a call answered without touching the network.
    pub fn resolve_local(&self, method: LocalMethod) -> Value {
        match method {
            LocalMethod::Accounts => json!(self.accounts),
        }
    }
}
