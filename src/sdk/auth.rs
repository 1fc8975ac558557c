//! Alloy-backed authentication SDK.
//!
//! # Responsibilities
//! - Build and register wallet adapters from configuration
//! - Connect through an adapter and hold the session's provider handle
//! - Emit lifecycle events to the subscribed sink

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use dashmap::DashMap;

use crate::chain::ChainConfig;
use crate::config::{AdapterConfig, RpcConfig};
use crate::sdk::adapter::{AdapterKind, InjectedAdapter, PrivateKeyAdapter, ProviderHandle, WalletAdapter};
use crate::sdk::error::SdkError;
use crate::sdk::events::{AuthEvent, EventSink, SessionInfo};
use crate::sdk::AuthSdk;

/// Authentication SDK bound to one chain.
pub struct AuthCore {
    chain: ChainConfig,
    settings: Vec<AdapterConfig>,
    rpc_timeout: Option<Duration>,
    adapters: DashMap<AdapterKind, Arc<dyn WalletAdapter>>,
    sink: OnceLock<EventSink>,
    provider: ArcSwapOption<ProviderHandle>,
    initialized: AtomicBool,
}

impl AuthCore {
    pub fn new(chain: ChainConfig, settings: Vec<AdapterConfig>, rpc: &RpcConfig) -> Self {
        Self {
            chain,
            settings,
            rpc_timeout: rpc.timeout(),
            adapters: DashMap::new(),
            sink: OnceLock::new(),
            provider: ArcSwapOption::empty(),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    /// Register an adapter object directly, replacing any adapter of the same kind.
    pub fn register_adapter(&self, adapter: Arc<dyn WalletAdapter>) {
        let kind = adapter.kind();
        if self.adapters.insert(kind, adapter).is_some() {
            tracing::warn!(adapter = %kind, "Replacing registered wallet adapter");
        }
        tracing::debug!(adapter = %kind, "Wallet adapter registered");
    }

    pub fn registered_adapters(&self) -> Vec<AdapterKind> {
        let mut kinds: Vec<_> = self.adapters.iter().map(|entry| *entry.key()).collect();
        kinds.sort_by_key(|kind| kind.as_str());
        kinds
    }

    fn build_adapter(&self, kind: AdapterKind) -> Result<Arc<dyn WalletAdapter>, SdkError> {
        let settings = self
            .settings
            .iter()
            .find(|s| s.kind == kind && s.enabled)
            .ok_or(SdkError::AdapterNotRegistered(kind))?;
        let endpoint = settings
            .endpoint
            .clone()
            .unwrap_or_else(|| self.chain.rpc_target.clone());

        let adapter: Arc<dyn WalletAdapter> = match kind {
            AdapterKind::PrivateKey => Arc::new(PrivateKeyAdapter::from_env(endpoint, self.rpc_timeout)?),
            other => Arc::new(InjectedAdapter::new(other, endpoint, self.rpc_timeout)),
        };
        Ok(adapter)
    }

    fn emit(&self, event: AuthEvent) {
        match self.sink.get() {
            Some(sink) => {
                sink.emit(event);
            }
            None => tracing::debug!(event = event.label(), "No lifecycle subscriber"),
        }
    }

    fn fail(&self, err: SdkError) -> SdkError {
        self.emit(AuthEvent::Errored(err.clone()));
        err
    }
}

#[async_trait]
impl AuthSdk for AuthCore {
    type Handle = ProviderHandle;

    fn configure_adapter(&self, kind: AdapterKind) -> Result<(), SdkError> {
        let adapter = self.build_adapter(kind)?;
        self.register_adapter(adapter);
        Ok(())
    }

    fn subscribe(&self, sink: EventSink) {
        if self.sink.set(sink).is_err() {
            tracing::warn!("Lifecycle events already have a subscriber; ignoring");
        }
    }

    async fn init(&self) -> Result<(), SdkError> {
        if self.adapters.is_empty() {
            return Err(SdkError::Initialization(
                "no wallet adapters registered".to_string(),
            ));
        }
        self.chain
            .numeric_chain_id()
            .map_err(|e| SdkError::Initialization(e.to_string()))?;

        self.initialized.store(true, Ordering::SeqCst);
        tracing::info!(
            chain = %self.chain.identifier,
            chain_id = %self.chain.chain_id,
            adapters = self.adapters.len(),
            "Wallet SDK initialized"
        );
        Ok(())
    }

    async fn connect_to(&self, adapter: AdapterKind) -> Result<ProviderHandle, SdkError> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(self.fail(SdkError::NotInitialized));
        }
        if self.provider.load().is_some() {
            return Err(self.fail(SdkError::AlreadyConnected));
        }
        let Some(wallet) = self.adapters.get(&adapter).map(|entry| Arc::clone(entry.value())) else {
            return Err(self.fail(SdkError::AdapterNotRegistered(adapter)));
        };

        self.emit(AuthEvent::Connecting);
        match wallet.connect(&self.chain).await {
            Ok(handle) => {
                self.provider.store(Some(Arc::new(handle.clone())));
                self.emit(AuthEvent::Connected(SessionInfo::new(adapter, self.chain.chain_id.clone())));
                Ok(handle)
            }
            Err(e) => {
                tracing::warn!(adapter = %adapter, error = %e, "Wallet connection failed");
                Err(self.fail(e))
            }
        }
    }

    async fn logout(&self) -> Result<(), SdkError> {
        match self.provider.swap(None) {
            Some(handle) => {
                tracing::info!(adapter = %handle.adapter(), "Wallet session closed");
                self.emit(AuthEvent::Disconnected);
                Ok(())
            }
            None => Err(SdkError::NotConnected),
        }
    }

    fn provider(&self) -> Option<ProviderHandle> {
        self.provider.load_full().map(|handle| (*handle).clone())
    }
}

impl std::fmt::Debug for AuthCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthCore")
            .field("chain", &self.chain.identifier)
            .field("adapters", &self.registered_adapters())
            .field("connected", &self.provider.load().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainRegistry;
    use crate::rpc::RpcClient;
    use crate::sdk::adapter::AccountSource;
    use alloy::primitives::Address;

    struct StaticAdapter {
        kind: AdapterKind,
        outcome: Result<(), SdkError>,
    }

    #[async_trait]
    impl WalletAdapter for StaticAdapter {
        fn kind(&self) -> AdapterKind {
            self.kind
        }

        async fn connect(&self, _chain: &ChainConfig) -> Result<ProviderHandle, SdkError> {
            self.outcome.clone()?;
            let client = RpcClient::connect("http://127.0.0.1:9", None).unwrap();
            Ok(ProviderHandle::new(client, AccountSource::Local(Address::ZERO), self.kind, 137))
        }
    }

    fn polygon_core() -> AuthCore {
        let chain = ChainRegistry::builtin().lookup("polygon").unwrap().clone();
        AuthCore::new(
            chain,
            vec![AdapterConfig::enabled(AdapterKind::Metamask)],
            &RpcConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_init_requires_adapters() {
        let core = polygon_core();
        assert!(matches!(core.init().await, Err(SdkError::Initialization(_))));

        core.configure_adapter(AdapterKind::Metamask).unwrap();
        assert!(core.init().await.is_ok());
    }

    #[test]
    fn test_disabled_adapter_is_not_configured() {
        let core = polygon_core();
        assert_eq!(
            core.configure_adapter(AdapterKind::TorusEvm),
            Err(SdkError::AdapterNotRegistered(AdapterKind::TorusEvm))
        );
        assert!(core.registered_adapters().is_empty());
    }

    #[tokio::test]
    async fn test_connect_emits_connecting_then_connected() {
        let core = polygon_core();
        let (sink, mut events) = EventSink::channel();
        core.subscribe(sink);
        core.register_adapter(Arc::new(StaticAdapter {
            kind: AdapterKind::Metamask,
            outcome: Ok(()),
        }));
        core.init().await.unwrap();

        let handle = core.connect_to(AdapterKind::Metamask).await.unwrap();
        assert_eq!(handle.chain_id(), 137);
        assert!(core.provider().is_some());

        assert_eq!(events.recv().await, Some(AuthEvent::Connecting));
        match events.recv().await {
            Some(AuthEvent::Connected(info)) => {
                assert_eq!(info.adapter, AdapterKind::Metamask);
                assert_eq!(info.chain_id, "0x89");
            }
            other => panic!("expected connected event, got {:?}", other),
        }

        // A second connect while the session is open is refused.
        assert_eq!(
            core.connect_to(AdapterKind::Metamask).await.unwrap_err(),
            SdkError::AlreadyConnected
        );
        assert!(matches!(events.recv().await, Some(AuthEvent::Errored(SdkError::AlreadyConnected))));

        core.logout().await.unwrap();
        assert!(core.provider().is_none());
        assert_eq!(events.recv().await, Some(AuthEvent::Disconnected));
        assert_eq!(core.logout().await, Err(SdkError::NotConnected));
    }

    #[tokio::test]
    async fn test_rejected_connect_emits_errored() {
        let core = polygon_core();
        let (sink, mut events) = EventSink::channel();
        core.subscribe(sink);
        core.register_adapter(Arc::new(StaticAdapter {
            kind: AdapterKind::TorusEvm,
            outcome: Err(SdkError::UserRejected("closed popup".to_string())),
        }));
        core.init().await.unwrap();

        let err = core.connect_to(AdapterKind::TorusEvm).await.unwrap_err();
        assert!(matches!(err, SdkError::UserRejected(_)));
        assert!(core.provider().is_none());

        assert_eq!(events.recv().await, Some(AuthEvent::Connecting));
        assert_eq!(events.recv().await, Some(AuthEvent::Errored(err)));
    }

    #[tokio::test]
    async fn test_connect_before_init() {
        let core = polygon_core();
        assert_eq!(
            core.connect_to(AdapterKind::Metamask).await.unwrap_err(),
            SdkError::NotInitialized
        );
    }

    #[tokio::test]
    async fn test_unregistered_adapter() {
        let core = polygon_core();
        core.configure_adapter(AdapterKind::Metamask).unwrap();
        core.init().await.unwrap();
        assert_eq!(
            core.connect_to(AdapterKind::WalletConnectV1).await.unwrap_err(),
            SdkError::AdapterNotRegistered(AdapterKind::WalletConnectV1)
        );
    }
}
