//! Lifecycle manager error definitions.

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::sdk::SdkError;

/// Errors returned by [`LifecycleManager`](crate::lifecycle::LifecycleManager) actions.
///
/// Everything except [`LifecycleError::InitializationFailed`] is recoverable:
/// the manager keeps running and the user may retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    /// No SDK handle exists yet (initialization missing or still in flight).
    #[error("Wallet adapters unavailable: SDK not initialized")]
    AdapterUnavailable,

    /// No account gateway is bound (session not connected).
    #[error("Account gateway not ready: wallet not connected")]
    GatewayNotReady,

    #[error("Lifecycle manager already initialized")]
    AlreadyInitialized,

    #[error("Unknown chain '{0}'")]
    UnknownChain(String),

    /// Fatal for the manager instance; build a new one.
    #[error("Initialization failed: {0}")]
    InitializationFailed(#[source] SdkError),

    #[error("A login is already in progress")]
    LoginInProgress,

    #[error("Wallet already connected")]
    AlreadyConnected,

    #[error(transparent)]
    Sdk(#[from] SdkError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The manager was torn down.
    #[error("Lifecycle manager stopped")]
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparent_wrappers() {
        let err = LifecycleError::from(GatewayError::NoAccountsAvailable);
        assert_eq!(err.to_string(), "No accounts available");

        let err = LifecycleError::from(SdkError::NotConnected);
        assert_eq!(err.to_string(), "No active wallet session");
    }

    #[test]
    fn test_initialization_failure_keeps_source() {
        use std::error::Error as _;
        let err = LifecycleError::InitializationFailed(SdkError::Initialization("boom".to_string()));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("boom"));
    }
}
