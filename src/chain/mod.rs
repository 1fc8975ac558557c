//! Chain registry subsystem.
//!
//! # Data Flow
//! ```text
//! built-in table (polygon, mumbai)
//!     + [[chains]] entries from the config file
//!     → ChainRegistry (immutable, process lifetime)
//!     → LifecycleManager::initialize looks up one ChainConfig
//!     → SDK + RPC clients are built from it
//! ```
//!
//! Adding a chain means adding a table entry; nothing else changes.

pub mod registry;

pub use registry::{ChainConfig, ChainNamespace, ChainRegistry, RegistryError};
