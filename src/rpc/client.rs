//! Thin wrapper over an alloy provider.
//!
//! No retry or failover: a failed call is reported once. Calls have no
//! deadline unless `rpc.timeout_secs` is configured.

use std::future::IntoFuture;
use std::time::Duration;

use alloy::network::Ethereum;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::{TransportError, TransportResult};
use thiserror::Error;
use tokio::time::timeout;
use url::Url;

/// EIP-1193 "User Rejected Request".
pub const USER_REJECTED_CODE: i64 = 4001;

/// Errors produced by [`RpcClient`].
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The endpoint answered with an error, or the transport failed.
    #[error("RPC error: {message}")]
    Rpc { code: Option<i64>, message: String },

    /// Opt-in deadline elapsed.
    #[error("RPC timeout after {0:?}")]
    Timeout(Duration),

    #[error("Invalid RPC URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ClientError {
    /// Whether the wallet reported that the user declined the request.
    pub fn is_user_rejection(&self) -> bool {
        match self {
            Self::Rpc { code: Some(USER_REJECTED_CODE), .. } => true,
            Self::Rpc { message, .. } => {
                let message = message.to_lowercase();
                message.contains("user denied") || message.contains("user rejected")
            }
            _ => false,
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        let code = err.as_error_resp().map(|payload| payload.code);
        Self::Rpc {
            code,
            message: err.to_string(),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// JSON-RPC client bound to one endpoint.
#[derive(Clone)]
pub struct RpcClient {
    provider: DynProvider<Ethereum>,
    endpoint: Url,
    timeout: Option<Duration>,
}

impl RpcClient {
    /// Client whose accounts are managed by the endpoint (an injected wallet bridge).
    ///
    /// No fillers: the wallet completes gas, nonce and signature for
    /// `eth_sendTransaction` itself.
    pub fn connect(endpoint: &str, timeout: Option<Duration>) -> ClientResult<Self> {
        let url = parse_endpoint(endpoint)?;
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(url.clone())
            .erased();
        Ok(Self {
            provider,
            endpoint: url,
            timeout,
        })
    }

    /// Client that signs transactions locally with `signer`.
    pub fn connect_with_signer(
        endpoint: &str,
        signer: PrivateKeySigner,
        timeout: Option<Duration>,
    ) -> ClientResult<Self> {
        let url = parse_endpoint(endpoint)?;
        let provider = ProviderBuilder::new()
            .wallet(signer)
            .connect_http(url.clone())
            .erased();
        Ok(Self {
            provider,
            endpoint: url,
            timeout,
        })
    }

    async fn call<T, F>(&self, request: F) -> ClientResult<T>
    where
        F: IntoFuture<Output = TransportResult<T>>,
    {
        match self.timeout {
            Some(limit) => match timeout(limit, request).await {
                Ok(result) => result.map_err(ClientError::from),
                Err(_) => Err(ClientError::Timeout(limit)),
            },
            None => request.await.map_err(ClientError::from),
        }
    }

    /// `eth_requestAccounts`: asks the wallet to expose its accounts.
    pub async fn request_accounts(&self) -> ClientResult<Vec<Address>> {
        self.call(
            self.provider
                .raw_request::<_, Vec<Address>>("eth_requestAccounts".into(), ()),
        )
        .await
    }

    /// `eth_accounts`.
    pub async fn accounts(&self) -> ClientResult<Vec<Address>> {
        self.call(self.provider.get_accounts()).await
    }

    pub async fn chain_id(&self) -> ClientResult<u64> {
        self.call(self.provider.get_chain_id()).await
    }

    pub async fn balance(&self, address: Address) -> ClientResult<U256> {
        self.call(self.provider.get_balance(address)).await
    }

    /// Submit a transaction through the provider and return its hash without
    /// waiting for inclusion.
    pub async fn send_transaction(&self, tx: TransactionRequest) -> ClientResult<TxHash> {
        let pending = self.call(self.provider.send_transaction(tx)).await?;
        Ok(*pending.tx_hash())
    }

    pub async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> ClientResult<Option<TransactionReceipt>> {
        self.call(self.provider.get_transaction_receipt(tx_hash)).await
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn parse_endpoint(endpoint: &str) -> ClientResult<Url> {
    endpoint.parse().map_err(|e: url::ParseError| ClientError::InvalidUrl {
        url: endpoint.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_rejection_by_code() {
        let err = ClientError::Rpc {
            code: Some(USER_REJECTED_CODE),
            message: "whatever".to_string(),
        };
        assert!(err.is_user_rejection());
    }

    #[test]
    fn test_user_rejection_by_message() {
        let err = ClientError::Rpc {
            code: Some(-32603),
            message: "MetaMask Tx Signature: User denied transaction signature.".to_string(),
        };
        assert!(err.is_user_rejection());

        let err = ClientError::Rpc {
            code: Some(-32000),
            message: "insufficient funds for gas".to_string(),
        };
        assert!(!err.is_user_rejection());
        assert!(!ClientError::Timeout(Duration::from_secs(5)).is_user_rejection());
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = RpcClient::connect("not a url", None).unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl { .. }));
        assert!(err.to_string().contains("not a url"));
    }

    #[tokio::test]
    async fn test_client_creation_is_lazy() {
        // Nothing listens here; building the client must not touch the network.
        let client = RpcClient::connect("http://127.0.0.1:9", Some(Duration::from_secs(1))).unwrap();
        assert_eq!(client.endpoint().as_str(), "http://127.0.0.1:9/");
        assert_eq!(client.timeout(), Some(Duration::from_secs(1)));
        assert!(client.chain_id().await.is_err());
    }

    #[tokio::test]
    async fn test_timeout_keeps_sub_second_precision() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let limit = Duration::from_millis(50);
        let client = RpcClient::connect(&format!("http://{addr}"), Some(limit)).unwrap();
        let err = client.chain_id().await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout(d) if d == limit), "{err:?}");
        assert_eq!(err.to_string(), "RPC timeout after 50ms");
    }
}
