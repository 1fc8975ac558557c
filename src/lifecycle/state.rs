//! UI-facing lifecycle state.

use std::fmt;

use alloy::primitives::Address;

use crate::gateway::Balance;
use crate::sdk::SessionInfo;

/// Connection phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Connecting,
    Connected,
    Disconnected,
    /// Recoverable: a new login may follow.
    Errored,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Snapshot published to the presentation layer.
///
/// When not connected, `account_address`, `account_balance` and `session`
/// are all `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleState {
    pub phase: Phase,
    pub loading: bool,
    pub account_address: Option<Address>,
    pub account_balance: Option<Balance>,
    pub session: Option<SessionInfo>,
    /// Last recoverable error, as shown to the user.
    pub last_error: Option<String>,
}

impl LifecycleState {
    pub fn connected(&self) -> bool {
        self.phase == Phase::Connected
    }

    pub(crate) fn clear_session(&mut self) {
        self.account_address = None;
        self.account_balance = None;
        self.session = None;
    }
}
