//! JSON-RPC client plumbing.
//!
//! # Responsibilities
//! - Build alloy providers for an endpoint (read-only or with a local signer)
//! - Apply the optional per-call timeout
//! - Classify RPC failures (EIP-1193 user rejection vs everything else)

pub mod client;

pub use client::{ClientError, ClientResult, RpcClient, USER_REJECTED_CODE};
