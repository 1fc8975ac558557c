//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chain::ChainConfig;
use crate::sdk::AdapterKind;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Chain identifier the session runs against.
    pub chain: String,

    /// Extra chain registry entries.
    pub chains: Vec<ChainConfig>,

    /// Wallet adapters offered to the user.
    pub adapters: Vec<AdapterConfig>,

    pub rpc: RpcConfig,

    pub observability: ObservabilityConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chain: "polygon".to_string(),
            chains: Vec::new(),
            adapters: vec![
                AdapterConfig::enabled(AdapterKind::Metamask),
                AdapterConfig::enabled(AdapterKind::TorusEvm),
                AdapterConfig::enabled(AdapterKind::WalletConnectV1),
                AdapterConfig {
                    kind: AdapterKind::PrivateKey,
                    enabled: false,
                    endpoint: None,
                },
            ],
            rpc: RpcConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Adapters the lifecycle manager should register, in declaration order.
    pub fn enabled_adapters(&self) -> Vec<AdapterKind> {
        self.adapters
            .iter()
            .filter(|a| a.enabled)
            .map(|a| a.kind)
            .collect()
    }

    pub fn adapter(&self, kind: AdapterKind) -> Option<&AdapterConfig> {
        self.adapters.iter().find(|a| a.kind == kind)
    }
}

/// Per-adapter settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdapterConfig {
    pub kind: AdapterKind,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// JSON-RPC endpoint of the wallet bridge. Falls back to the chain's RPC target.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl AdapterConfig {
    pub fn enabled(kind: AdapterKind) -> Self {
        Self {
            kind,
            enabled: true,
            endpoint: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// RPC client settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Per-call deadline in seconds. Unset means calls may wait indefinitely.
    pub timeout_secs: Option<u64>,
}

impl RpcConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
