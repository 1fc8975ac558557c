//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Selected chain must exist in the registry built from the config
//! - Endpoints must be valid URLs, timeouts > 0
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SessionConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::chain::{ChainRegistry, RegistryError};
use crate::config::schema::SessionConfig;
use crate::sdk::AdapterKind;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown chain '{0}'")]
    UnknownChain(String),

    #[error("Chain '{identifier}': {reason}")]
    InvalidChain { identifier: String, reason: String },

    #[error("Adapter '{0}' is listed more than once")]
    DuplicateAdapter(AdapterKind),

    #[error("Adapter '{adapter}' endpoint '{endpoint}' is not a valid URL")]
    InvalidEndpoint { adapter: AdapterKind, endpoint: String },

    #[error("No wallet adapter is enabled")]
    NoAdapters,

    #[error("rpc.timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("Invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &SessionConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for chain in &config.chains {
        if Url::parse(&chain.rpc_target).is_err() {
            errors.push(ValidationError::InvalidChain {
                identifier: chain.identifier.clone(),
                reason: format!("rpc_target '{}' is not a valid URL", chain.rpc_target),
            });
        }
    }

    match ChainRegistry::with_entries(config.chains.iter().cloned()) {
        Ok(registry) => {
            if registry.lookup(&config.chain).is_none() {
                errors.push(ValidationError::UnknownChain(config.chain.clone()));
            }
        }
        Err(e) => errors.push(ValidationError::InvalidChain {
            identifier: match &e {
                RegistryError::Duplicate(id) => id.clone(),
                RegistryError::InvalidChainId(_) => "chains".to_string(),
            },
            reason: e.to_string(),
        }),
    }

    let mut seen = HashSet::new();
    for adapter in &config.adapters {
        if !seen.insert(adapter.kind) {
            errors.push(ValidationError::DuplicateAdapter(adapter.kind));
        }
        if let Some(endpoint) = &adapter.endpoint {
            if Url::parse(endpoint).is_err() {
                errors.push(ValidationError::InvalidEndpoint {
                    adapter: adapter.kind,
                    endpoint: endpoint.clone(),
                });
            }
        }
    }

    if config.enabled_adapters().is_empty() {
        errors.push(ValidationError::NoAdapters);
    }

    if config.rpc.timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
