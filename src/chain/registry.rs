//! Static chain configuration table.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chain namespace, as understood by wallet adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainNamespace {
    /// EVM chains addressed by an EIP-155 chain id.
    Eip155,
    Solana,
    Other,
}

/// Connection parameters for one chain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChainConfig {
    /// Registry key (e.g. "polygon").
    pub identifier: String,

    #[serde(default = "default_namespace")]
    pub namespace: ChainNamespace,

    /// JSON-RPC endpoint.
    pub rpc_target: String,

    /// Block explorer base URL.
    pub block_explorer: String,

    /// Hex-encoded chain id (e.g. "0x89").
    pub chain_id: String,

    pub display_name: String,

    /// Native token ticker (e.g. "matic").
    pub ticker: String,

    pub ticker_name: String,
}

fn default_namespace() -> ChainNamespace {
    ChainNamespace::Eip155
}

/// Errors raised while reading chain parameters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Invalid chain id '{0}': expected a 0x-prefixed hex number")]
    InvalidChainId(String),

    #[error("Duplicate chain identifier '{0}'")]
    Duplicate(String),
}

impl ChainConfig {
    /// Parse the hex chain id into its numeric form.
    pub fn numeric_chain_id(&self) -> Result<u64, RegistryError> {
        let digits = self
            .chain_id
            .strip_prefix("0x")
            .or_else(|| self.chain_id.strip_prefix("0X"))
            .ok_or_else(|| RegistryError::InvalidChainId(self.chain_id.clone()))?;

        u64::from_str_radix(digits, 16)
            .map_err(|_| RegistryError::InvalidChainId(self.chain_id.clone()))
    }

    /// Explorer link for a transaction hash.
    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.block_explorer.trim_end_matches('/'), tx_hash)
    }

    fn polygon() -> Self {
        Self {
            identifier: "polygon".to_string(),
            namespace: ChainNamespace::Eip155,
            rpc_target: "https://polygon-rpc.com".to_string(),
            block_explorer: "https://polygonscan.com/".to_string(),
            chain_id: "0x89".to_string(),
            display_name: "Polygon Mainnet".to_string(),
            ticker: "matic".to_string(),
            ticker_name: "Matic".to_string(),
        }
    }

    fn mumbai() -> Self {
        Self {
            identifier: "mumbai".to_string(),
            namespace: ChainNamespace::Eip155,
            rpc_target: "https://rpc-mumbai.maticvigil.com/".to_string(),
            block_explorer: "https://polygonscan.com/".to_string(),
            chain_id: "0x13881".to_string(),
            display_name: "Mumbai Testnet".to_string(),
            ticker: "matic".to_string(),
            ticker_name: "Matic".to_string(),
        }
    }
}

/// Lookup table from chain identifier to [`ChainConfig`].
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: Vec<ChainConfig>,
}

impl ChainRegistry {
    /// Registry with the built-in chains only.
    pub fn builtin() -> Self {
        Self {
            chains: vec![ChainConfig::polygon(), ChainConfig::mumbai()],
        }
    }

    /// Built-in chains plus extra entries (usually from the config file).
    ///
    /// An extra entry may not reuse an identifier that is already registered.
    pub fn with_entries(extra: impl IntoIterator<Item = ChainConfig>) -> Result<Self, RegistryError> {
        let mut registry = Self::builtin();
        for chain in extra {
            if registry.lookup(&chain.identifier).is_some() {
                return Err(RegistryError::Duplicate(chain.identifier));
            }
            chain.numeric_chain_id()?;
            registry.chains.push(chain);
        }
        Ok(registry)
    }

    pub fn lookup(&self, identifier: &str) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.identifier == identifier)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.chains.iter().map(|c| c.identifier.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainConfig> {
        self.chains.iter()
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
