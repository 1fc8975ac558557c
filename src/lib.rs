//! Wallet session library.
//!
//! Connects a user's wallet through pluggable adapters, tracks the
//! connection lifecycle and exposes account queries and purchases over
//! the live session.

// Core subsystems
pub mod chain;
pub mod gateway;
pub mod lifecycle;
pub mod rpc;
pub mod sdk;

// Front end
pub mod presentation;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use chain::{ChainConfig, ChainRegistry};
pub use config::SessionConfig;
pub use gateway::{AccountGateway, EthGateway};
pub use lifecycle::{LifecycleError, LifecycleManager, LifecycleState, Phase, Shutdown};
pub use sdk::{AuthCore, AuthSdk};
