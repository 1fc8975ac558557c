//! Wallet adapters and the provider handle they produce.
//!
//! # Security
//! - The private-key adapter reads its key ONLY from the environment
//! - Keys are never logged or serialized

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::chain::ChainConfig;
use crate::rpc::{ClientError, RpcClient};
use crate::sdk::error::SdkError;

/// Environment variable holding the key for [`AdapterKind::PrivateKey`].
pub const PRIVATE_KEY_ENV_VAR: &str = "WALLET_SESSION_PRIVATE_KEY";

/// Pluggable wallet-connection backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdapterKind {
    /// Browser-extension wallet.
    #[serde(rename = "metamask")]
    Metamask,
    /// Social-recovery wallet.
    #[serde(rename = "torus-evm")]
    TorusEvm,
    /// Relay-based wallet.
    #[serde(rename = "wallet-connect-v1")]
    WalletConnectV1,
    /// Local key for headless use.
    #[serde(rename = "private-key")]
    PrivateKey,
}

impl AdapterKind {
    pub const ALL: [AdapterKind; 4] = [
        AdapterKind::Metamask,
        AdapterKind::TorusEvm,
        AdapterKind::WalletConnectV1,
        AdapterKind::PrivateKey,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metamask => "metamask",
            Self::TorusEvm => "torus-evm",
            Self::WalletConnectV1 => "wallet-connect-v1",
            Self::PrivateKey => "private-key",
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdapterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown wallet adapter '{}' (expected one of: metamask, torus-evm, wallet-connect-v1, private-key)",
                    s
                )
            })
    }
}

/// Where the session's accounts come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountSource {
    /// The wallet behind the endpoint manages accounts (`eth_accounts`).
    Wallet,
    /// A local signer; its address is the only account.
    Local(Address),
}

/// Capability for one wallet session.
#[derive(Debug, Clone)]
pub struct ProviderHandle {
    client: RpcClient,
    accounts: AccountSource,
    adapter: AdapterKind,
    chain_id: u64,
}

impl ProviderHandle {
    pub fn new(client: RpcClient, accounts: AccountSource, adapter: AdapterKind, chain_id: u64) -> Self {
        Self {
            client,
            accounts,
            adapter,
            chain_id,
        }
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    pub fn accounts(&self) -> AccountSource {
        self.accounts
    }

    pub fn adapter(&self) -> AdapterKind {
        self.adapter
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

/// A wallet backend the SDK can connect through.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    fn kind(&self) -> AdapterKind;

    /// Open a session on `chain`.
    async fn connect(&self, chain: &ChainConfig) -> Result<ProviderHandle, SdkError>;
}

/// Adapter for wallets that expose an EIP-1193 JSON-RPC bridge
/// (MetaMask, Torus EVM, WalletConnect v1).
#[derive(Debug, Clone)]
pub struct InjectedAdapter {
    kind: AdapterKind,
    endpoint: String,
    timeout: Option<Duration>,
}

impl InjectedAdapter {
    pub fn new(kind: AdapterKind, endpoint: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            kind,
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl WalletAdapter for InjectedAdapter {
    fn kind(&self) -> AdapterKind {
        self.kind
    }

    async fn connect(&self, chain: &ChainConfig) -> Result<ProviderHandle, SdkError> {
        let client = RpcClient::connect(&self.endpoint, self.timeout).map_err(|e| {
            SdkError::Configuration {
                adapter: self.kind,
                reason: e.to_string(),
            }
        })?;

        let accounts = client
            .request_accounts()
            .await
            .map_err(|e| adapter_failure(self.kind, e))?;
        if accounts.is_empty() {
            return Err(SdkError::Adapter {
                adapter: self.kind,
                reason: "wallet exposed no accounts".to_string(),
            });
        }

        let chain_id = verify_chain(self.kind, &client, chain).await?;

        tracing::info!(
            adapter = %self.kind,
            endpoint = %self.endpoint,
            accounts = accounts.len(),
            chain_id = chain_id,
            "Wallet adapter connected"
        );

        Ok(ProviderHandle::new(client, AccountSource::Wallet, self.kind, chain_id))
    }
}

/// Adapter that signs with a locally held key against the chain's RPC endpoint.
#[derive(Clone)]
pub struct PrivateKeyAdapter {
    signer: PrivateKeySigner,
    endpoint: String,
    timeout: Option<Duration>,
}

impl PrivateKeyAdapter {
    /// Build from a hex-encoded key (with or without 0x prefix).
    pub fn from_private_key(
        private_key_hex: &str,
        endpoint: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, SdkError> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);
        let signer: PrivateKeySigner = key_hex.parse().map_err(|e| SdkError::Configuration {
            adapter: AdapterKind::PrivateKey,
            reason: format!("Invalid private key format: {}", e),
        })?;

        Ok(Self {
            signer,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    /// Build from `WALLET_SESSION_PRIVATE_KEY`.
    pub fn from_env(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, SdkError> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| SdkError::Configuration {
            adapter: AdapterKind::PrivateKey,
            reason: format!("Environment variable {} not set", PRIVATE_KEY_ENV_VAR),
        })?;

        Self::from_private_key(&private_key, endpoint, timeout)
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

impl fmt::Debug for PrivateKeyAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyAdapter")
            .field("address", &self.signer.address())
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WalletAdapter for PrivateKeyAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::PrivateKey
    }

    async fn connect(&self, chain: &ChainConfig) -> Result<ProviderHandle, SdkError> {
        let client = RpcClient::connect_with_signer(&self.endpoint, self.signer.clone(), self.timeout)
            .map_err(|e| SdkError::Configuration {
                adapter: AdapterKind::PrivateKey,
                reason: e.to_string(),
            })?;

        let chain_id = verify_chain(AdapterKind::PrivateKey, &client, chain).await?;

        tracing::info!(
            address = %self.signer.address(),
            chain_id = chain_id,
            "Local signer connected"
        );

        Ok(ProviderHandle::new(
            client,
            AccountSource::Local(self.signer.address()),
            AdapterKind::PrivateKey,
            chain_id,
        ))
    }
}

async fn verify_chain(adapter: AdapterKind, client: &RpcClient, chain: &ChainConfig) -> Result<u64, SdkError> {
    let expected = chain.numeric_chain_id().map_err(|e| SdkError::Configuration {
        adapter,
        reason: e.to_string(),
    })?;
    let actual = client.chain_id().await.map_err(|e| adapter_failure(adapter, e))?;
    if actual != expected {
        return Err(SdkError::ChainMismatch { expected, actual });
    }
    Ok(actual)
}

fn adapter_failure(adapter: AdapterKind, err: ClientError) -> SdkError {
    if err.is_user_rejection() {
        SdkError::UserRejected(err.to_string())
    } else {
        SdkError::Adapter {
            adapter,
            reason: err.to_string(),
        }
    }
}
