//! Lifecycle events emitted by the SDK.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::sdk::adapter::AdapterKind;
use crate::sdk::error::SdkError;

/// Data carried by the `connected` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub adapter: AdapterKind,
    /// Hex chain id of the session.
    pub chain_id: String,
}

impl SessionInfo {
    pub fn new(adapter: AdapterKind, chain_id: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            adapter,
            chain_id: chain_id.into(),
        }
    }
}

/// The four lifecycle events an SDK reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    Connecting,
    Connected(SessionInfo),
    Disconnected,
    Errored(SdkError),
}

impl AuthEvent {
    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected(_) => "connected",
            Self::Disconnected => "disconnected",
            Self::Errored(_) => "errored",
        }
    }
}

/// Destination for lifecycle events.
///
/// Emission never blocks; events are delivered in the order they are emitted.
#[derive(Clone)]
pub struct EventSink {
    deliver: Arc<dyn Fn(AuthEvent) -> bool + Send + Sync>,
}

impl EventSink {
    /// Sink backed by a delivery function. The function returns `false` once
    /// the receiving side has gone away.
    pub fn new<F>(deliver: F) -> Self
    where
        F: Fn(AuthEvent) -> bool + Send + Sync + 'static,
    {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// Sink feeding a plain unbounded channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<AuthEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(move |event| tx.send(event).is_ok()), rx)
    }

    /// Deliver one event. Returns `false` if nobody is listening any more.
    pub fn emit(&self, event: AuthEvent) -> bool {
        let label = event.label();
        let delivered = (self.deliver)(event);
        if !delivered {
            tracing::debug!(event = label, "Lifecycle event dropped: no subscriber");
        }
        delivered
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}
