//! Plain-text rendering of [`LifecycleState`].

use std::fmt;

use crate::chain::ChainConfig;
use crate::lifecycle::{LifecycleState, Phase};

/// One rendered frame of the wallet status.
#[derive(Debug, Clone)]
pub struct StatusView<'a> {
    state: &'a LifecycleState,
    chain: Option<&'a ChainConfig>,
}

impl<'a> StatusView<'a> {
    pub fn new(state: &'a LifecycleState, chain: Option<&'a ChainConfig>) -> Self {
        Self { state, chain }
    }

    /// Commands that make sense in the current state.
    pub fn actions(&self) -> &'static [&'static str] {
        if self.state.loading {
            return &[];
        }
        match self.state.phase {
            Phase::Connected => &["logout", "refresh", "buy <token> <id>", "tx <hash>"],
            Phase::Connecting => &[],
            Phase::Idle | Phase::Disconnected | Phase::Errored => &["login <adapter>"],
        }
    }
}

impl fmt::Display for StatusView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state;
        writeln!(f, "Loading: {} - Connected: {}", state.loading, state.connected())?;
        match &state.last_error {
            Some(err) => writeln!(f, "Error: {err}")?,
            None => writeln!(f, "Error: none")?,
        }

        if let Some(chain) = self.chain {
            writeln!(f, "Chain: {} ({})", chain.display_name, chain.chain_id)?;
        }
        if let Some(session) = &state.session {
            writeln!(f, "Wallet: {} (session {})", session.adapter, session.session_id)?;
        }
        if let Some(address) = state.account_address {
            writeln!(f, "Account: {address}")?;
        }
        if let Some(balance) = state.account_balance {
            let ticker = self.chain.map(|c| c.ticker.as_str()).unwrap_or("");
            writeln!(f, "Balance: {balance} {ticker}")?;
        }

        let actions = self.actions();
        if actions.is_empty() {
            write!(f, "Actions: (waiting)")
        } else {
            write!(f, "Actions: {}", actions.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainRegistry;
    use crate::gateway::Balance;
    use crate::sdk::{AdapterKind, SessionInfo};
    use alloy::primitives::{address, U256};

    #[test]
    fn test_idle_render() {
        let state = LifecycleState::default();
        let rendered = StatusView::new(&state, None).to_string();
        assert!(rendered.starts_with("Loading: false - Connected: false\nError: none\n"));
        assert!(rendered.ends_with("Actions: login <adapter>"));
    }

    #[test]
    fn test_connected_render() {
        let registry = ChainRegistry::builtin();
        let chain = registry.lookup("polygon");
        let state = LifecycleState {
            phase: Phase::Connected,
            loading: false,
            account_address: Some(address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")),
            account_balance: Some(Balance::from_wei(U256::from(1_500_000_000_000_000_000u128))),
            session: Some(SessionInfo::new(AdapterKind::Metamask, "0x89")),
            last_error: None,
        };

        let rendered = StatusView::new(&state, chain).to_string();
        assert!(rendered.contains("Connected: true"));
        assert!(rendered.contains("Chain: Polygon Mainnet (0x89)"));
        assert!(rendered.contains("Wallet: metamask"));
        assert!(rendered.contains("Account: 0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
        assert!(rendered.contains("Balance: 1.500 matic"));
        assert!(rendered.contains("Actions: logout, refresh"));
    }

    #[test]
    fn test_loading_hides_actions() {
        let state = LifecycleState {
            phase: Phase::Connecting,
            loading: true,
            ..Default::default()
        };
        let view = StatusView::new(&state, None);
        assert!(view.actions().is_empty());
        assert!(view.to_string().ends_with("Actions: (waiting)"));
    }

    #[test]
    fn test_error_line() {
        let state = LifecycleState {
            phase: Phase::Errored,
            last_error: Some("User rejected the request".to_string()),
            ..Default::default()
        };
        let rendered = StatusView::new(&state, None).to_string();
        assert!(rendered.contains("Error: User rejected the request"));
    }
}
