//! Connection lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! AuthSdk events ──┐
//!                  ├─→ event pump (pump.rs) ─→ watch<LifecycleState> ─→ presentation
//! manager commands ┘         │
//!                            └─→ binds / drops the AccountGateway
//! ```
//!
//! # Design Decisions
//! - One queue for events and commands: handled strictly in arrival order
//! - Account fetches are tagged with a session epoch; results from a
//!   closed session are discarded
//! - Work that holds the gateway runs in pump-owned tasks, aborted when the
//!   session ends
//! - The provider handle travels with the `connected` event that announced it
//! - Loading is held by a guard, so every exit path clears it

pub mod error;
pub mod manager;
mod pump;
pub mod shutdown;
pub mod state;

pub use error::LifecycleError;
pub use manager::{GatewayBinder, LifecycleManager, LogoutOutcome, SdkBuilder};
pub use shutdown::Shutdown;
pub use state::{LifecycleState, Phase};
