//! Wallet authentication SDK boundary.
//!
//! # Data Flow
//! ```text
//! LifecycleManager::initialize
//!     → SDK built from a ChainConfig
//!     → configure_adapter(kind) for every supported adapter
//!     → subscribe(EventSink)  (exactly once)
//!     → init()
//!
//! connect_to(kind):
//!     emit Connecting → adapter.connect() → store ProviderHandle
//!     → emit Connected(SessionInfo) | Errored(SdkError)
//!
//! logout():
//!     drop ProviderHandle → emit Disconnected
//! ```
//!
//! [`AuthSdk`] is the seam the lifecycle manager drives; [`AuthCore`] is the
//! alloy-backed implementation used by the binary.

pub mod adapter;
pub mod auth;
pub mod error;
pub mod events;

use async_trait::async_trait;

pub use adapter::{
    AccountSource, AdapterKind, InjectedAdapter, PrivateKeyAdapter, ProviderHandle, WalletAdapter,
    PRIVATE_KEY_ENV_VAR,
};
pub use auth::AuthCore;
pub use error::SdkError;
pub use events::{AuthEvent, EventSink, SessionInfo};

/// Operations the lifecycle manager needs from an authentication SDK.
#[async_trait]
pub trait AuthSdk: Send + Sync + 'static {
    /// Opaque per-session capability handed to the account gateway.
    type Handle: Clone + Send + Sync + 'static;

    /// Register one wallet adapter.
    fn configure_adapter(&self, kind: AdapterKind) -> Result<(), SdkError>;

    /// Deliver lifecycle events to `sink`.
    fn subscribe(&self, sink: EventSink);

    /// Finish setup once adapters are registered.
    async fn init(&self) -> Result<(), SdkError>;

    /// Connect through `adapter` and return the session's provider handle.
    async fn connect_to(&self, adapter: AdapterKind) -> Result<Self::Handle, SdkError>;

    async fn logout(&self) -> Result<(), SdkError>;

    /// Handle of the current session, if any.
    fn provider(&self) -> Option<Self::Handle>;
}
