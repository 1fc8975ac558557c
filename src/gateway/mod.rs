//! Account gateway subsystem.
//!
//! # Data Flow
//! ```text
//! Connected event
//!     → LifecycleManager binds a gateway to the SDK's provider handle
//!     → get_accounts / get_balance (account refresh)
//!     → sign_and_submit_purchase / get_transaction_status (user actions)
//!     → RpcClient → wallet / chain
//! ```
//!
//! The gateway holds no mutable state; calls may run concurrently against
//! the same handle.

pub mod error;
pub mod eth;
pub mod types;

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;

pub use error::{GatewayError, GatewayResult};
pub use eth::{EthGateway, PURCHASE_VALUE_WEI};
pub use types::{AccountInfo, Balance, TransactionStatus};

/// Uniform query/action interface over one wallet session.
#[async_trait]
pub trait AccountGateway: Send + Sync {
    /// Primary account address.
    async fn get_accounts(&self) -> GatewayResult<Address>;

    /// Native balance of the primary account.
    async fn get_balance(&self) -> GatewayResult<Balance>;

    /// Mint `token_id` on `token`, paying the fixed purchase value.
    async fn sign_and_submit_purchase(&self, token: Address, token_id: U256) -> GatewayResult<TxHash>;

    /// Receipt if mined, `Pending` otherwise.
    async fn get_transaction_status(&self, tx_hash: TxHash) -> GatewayResult<TransactionStatus>;
}

/// Fetch address and balance of the primary account.
pub async fn fetch_account(gateway: &dyn AccountGateway) -> GatewayResult<AccountInfo> {
    let address = gateway.get_accounts().await?;
    let balance = gateway.get_balance().await?;
    Ok(AccountInfo { address, balance })
}
