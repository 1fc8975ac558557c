//! Gateway error definitions.

use thiserror::Error;

/// Errors returned by [`AccountGateway`](crate::gateway::AccountGateway) operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The wallet reported zero accounts.
    #[error("No accounts available")]
    NoAccountsAvailable,

    #[error("Account query failed: {0}")]
    AccountQueryFailed(String),

    #[error("Balance query failed: {0}")]
    BalanceQueryFailed(String),

    /// The user declined the transaction in the wallet.
    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),

    #[error("Transaction submission failed: {0}")]
    TransactionSubmissionFailed(String),

    #[error("Receipt query failed: {0}")]
    ReceiptQueryFailed(String),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(GatewayError::NoAccountsAvailable.to_string(), "No accounts available");
        let err = GatewayError::BalanceQueryFailed("RPC timeout after 5 seconds".to_string());
        assert_eq!(err.to_string(), "Balance query failed: RPC timeout after 5 seconds");
    }
}
