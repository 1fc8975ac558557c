//! Account gateway over an alloy provider handle.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use async_trait::async_trait;

use crate::gateway::error::{GatewayError, GatewayResult};
use crate::gateway::types::{Balance, TransactionStatus};
use crate::gateway::AccountGateway;
use crate::observability::metrics;
use crate::rpc::ClientError;
use crate::sdk::{AccountSource, ProviderHandle};

/// Payment attached to every purchase: 0x174876E800 wei (100 gwei).
pub const PURCHASE_VALUE_WEI: u64 = 0x0017_4876_E800;

mod abi {
    alloy::sol! {
        function mint(address account, uint256 tokenId) external payable;
    }
}

/// Gateway bound to exactly one [`ProviderHandle`].
#[derive(Debug, Clone)]
pub struct EthGateway {
    handle: ProviderHandle,
}

impl EthGateway {
    pub fn new(handle: ProviderHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &ProviderHandle {
        &self.handle
    }

    async fn primary_account(&self) -> GatewayResult<Address> {
        match self.handle.accounts() {
            AccountSource::Local(address) => Ok(address),
            AccountSource::Wallet => {
                let accounts = self
                    .handle
                    .client()
                    .accounts()
                    .await
                    .map_err(|e| GatewayError::AccountQueryFailed(e.to_string()))?;
                accounts
                    .first()
                    .copied()
                    .ok_or(GatewayError::NoAccountsAvailable)
            }
        }
    }
}

#[async_trait]
impl AccountGateway for EthGateway {
    async fn get_accounts(&self) -> GatewayResult<Address> {
        let result = self.primary_account().await;
        metrics::record_gateway_call("get_accounts", result.is_ok());
        result
    }

    async fn get_balance(&self) -> GatewayResult<Balance> {
        let result: GatewayResult<Balance> = async {
            let account = self.primary_account().await.map_err(|e| match e {
                GatewayError::NoAccountsAvailable => e,
                other => GatewayError::BalanceQueryFailed(other.to_string()),
            })?;
            let wei = self
                .handle
                .client()
                .balance(account)
                .await
                .map_err(|e| GatewayError::BalanceQueryFailed(e.to_string()))?;
            Ok::<_, GatewayError>(Balance::from_wei(wei))
        }
        .await;
        metrics::record_gateway_call("get_balance", result.is_ok());
        result
    }

    async fn sign_and_submit_purchase(&self, token: Address, token_id: U256) -> GatewayResult<TxHash> {
        let result: GatewayResult<TxHash> = async {
            let account = self.primary_account().await.map_err(|e| match e {
                GatewayError::NoAccountsAvailable => e,
                other => GatewayError::TransactionSubmissionFailed(other.to_string()),
            })?;

            let calldata = abi::mintCall {
                account,
                tokenId: token_id,
            }
            .abi_encode();
            let tx = TransactionRequest::default()
                .with_from(account)
                .with_to(token)
                .with_input(Bytes::from(calldata))
                .with_value(U256::from(PURCHASE_VALUE_WEI));

            let tx_hash = self
                .handle
                .client()
                .send_transaction(tx)
                .await
                .map_err(submission_failure)?;

            tracing::info!(
                tx_hash = %tx_hash,
                token = %token,
                token_id = %token_id,
                "Purchase transaction submitted"
            );
            Ok::<_, GatewayError>(tx_hash)
        }
        .await;
        metrics::record_gateway_call("sign_and_submit_purchase", result.is_ok());
        result
    }

    async fn get_transaction_status(&self, tx_hash: TxHash) -> GatewayResult<TransactionStatus> {
        let result = self
            .handle
            .client()
            .transaction_receipt(tx_hash)
            .await
            .map(|receipt| match receipt {
                Some(receipt) => TransactionStatus::Mined(Box::new(receipt)),
                None => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    TransactionStatus::Pending
                }
            })
            .map_err(|e| GatewayError::ReceiptQueryFailed(e.to_string()));
        metrics::record_gateway_call("get_transaction_status", result.is_ok());
        result
    }
}

fn submission_failure(err: ClientError) -> GatewayError {
    if err.is_user_rejection() {
        GatewayError::TransactionRejected(err.to_string())
    } else {
        GatewayError::TransactionSubmissionFailed(err.to_string())
    }
}
