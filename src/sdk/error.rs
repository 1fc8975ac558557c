//! SDK error definitions.

use thiserror::Error;

use crate::sdk::adapter::AdapterKind;

/// Failures reported by the authentication SDK, either as a return value or
/// through an `Errored` lifecycle event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SdkError {
    #[error("Wallet SDK not initialized")]
    NotInitialized,

    /// Setup failed; the owning manager cannot be used any more.
    #[error("Wallet SDK initialization failed: {0}")]
    Initialization(String),

    #[error("Wallet adapter '{0}' is not registered")]
    AdapterNotRegistered(AdapterKind),

    #[error("Wallet adapter '{adapter}' is misconfigured: {reason}")]
    Configuration { adapter: AdapterKind, reason: String },

    #[error("A wallet session is already active")]
    AlreadyConnected,

    #[error("No active wallet session")]
    NotConnected,

    /// The user cancelled the request in the wallet.
    #[error("User rejected the request: {0}")]
    UserRejected(String),

    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("Wallet adapter '{adapter}' failed: {reason}")]
    Adapter { adapter: AdapterKind, reason: String },

    #[error("Connected event received without a provider handle")]
    MissingProvider,
}
