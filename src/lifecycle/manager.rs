//! Connection lifecycle manager.
//!
//! # Responsibilities
//! - Initialize the SDK for one chain and subscribe to its events
//! - Drive login / logout and keep the loading indicator honest
//! - Own exactly one account gateway per open session
//! - Publish [`LifecycleState`] snapshots to subscribers

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use alloy::primitives::{Address, TxHash, U256};
use tokio::sync::{mpsc, oneshot, watch};

use crate::chain::{ChainConfig, ChainRegistry, RegistryError};
use crate::config::SessionConfig;
use crate::gateway::{AccountGateway, AccountInfo, EthGateway, GatewayError, TransactionStatus};
use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::pump::{Envelope, EventPump, GatewayJob};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::state::{LifecycleState, Phase};
use crate::sdk::{AdapterKind, AuthCore, AuthEvent, AuthSdk, EventSink, ProviderHandle, SdkError};

/// Builds the SDK for the selected chain.
pub type SdkBuilder<S> = Box<dyn Fn(&ChainConfig) -> Result<S, SdkError> + Send + Sync>;

/// Binds a fresh gateway to a provider handle.
pub type GatewayBinder<H> = Arc<dyn Fn(H) -> Arc<dyn AccountGateway> + Send + Sync>;

/// Result of [`LifecycleManager::logout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    Disconnected,
    /// Nothing to log out of; no state was touched.
    NoActiveSession,
}

/// Handle to the lifecycle of one wallet session. Cheap to clone.
pub struct LifecycleManager<S: AuthSdk> {
    shared: Arc<Shared<S>>,
}

impl<S: AuthSdk> Clone for LifecycleManager<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct Shared<S: AuthSdk> {
    registry: ChainRegistry,
    adapters: Vec<AdapterKind>,
    build_sdk: SdkBuilder<S>,
    bind_gateway: GatewayBinder<S::Handle>,
    state: Arc<watch::Sender<LifecycleState>>,
    started: AtomicBool,
    running: OnceLock<Running<S>>,
    shutdown: Shutdown,
}

struct Running<S: AuthSdk> {
    sdk: Arc<S>,
    chain: ChainConfig,
    queue: mpsc::UnboundedSender<Envelope<S::Handle>>,
}

impl<S: AuthSdk> Running<S> {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Envelope<S::Handle>,
    ) -> Result<T, LifecycleError> {
        let (tx, rx) = oneshot::channel();
        self.queue.send(make(tx)).map_err(|_| LifecycleError::Stopped)?;
        rx.await.map_err(|_| LifecycleError::Stopped)
    }

    /// Like [`request`](Self::request) for work bound to the session. A
    /// reply dropped because the session ended maps to `GatewayNotReady`.
    async fn session_request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T, LifecycleError>>) -> Envelope<S::Handle>,
    ) -> Result<T, LifecycleError> {
        let (tx, rx) = oneshot::channel();
        self.queue
            .send(make(tx))
            .map_err(|_| LifecycleError::GatewayNotReady)?;
        rx.await.unwrap_or(Err(LifecycleError::GatewayNotReady))
    }
}

/// Holds `loading = true` for the lifetime of a user action.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<LifecycleState>,
}

impl<'a> LoadingGuard<'a> {
    fn engage(state: &'a watch::Sender<LifecycleState>) -> Self {
        state.send_modify(|s| s.loading = true);
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.loading = false);
    }
}

impl<S: AuthSdk> LifecycleManager<S> {
    /// `adapters` are configured on the SDK, in order, during [`initialize`](Self::initialize).
    pub fn new<B, G>(registry: ChainRegistry, adapters: Vec<AdapterKind>, build_sdk: B, bind_gateway: G) -> Self
    where
        B: Fn(&ChainConfig) -> Result<S, SdkError> + Send + Sync + 'static,
        G: Fn(S::Handle) -> Arc<dyn AccountGateway> + Send + Sync + 'static,
    {
        let (state, _) = watch::channel(LifecycleState::default());
        Self {
            shared: Arc::new(Shared {
                registry,
                adapters,
                build_sdk: Box::new(build_sdk),
                bind_gateway: Arc::new(bind_gateway),
                state: Arc::new(state),
                started: AtomicBool::new(false),
                running: OnceLock::new(),
                shutdown: Shutdown::new(),
            }),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<LifecycleState> {
        self.shared.state.subscribe()
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.shared.registry
    }

    /// Chain selected by a successful [`initialize`](Self::initialize).
    pub fn chain(&self) -> Option<&ChainConfig> {
        self.running().map(|r| &r.chain)
    }

    pub fn is_initialized(&self) -> bool {
        self.running().is_some()
    }

    fn running(&self) -> Option<&Running<S>> {
        self.shared.running.get()
    }

    /// Build the SDK for `chain_identifier`, configure adapters, subscribe
    /// to lifecycle events and start the SDK.
    ///
    /// May be called once per manager. A failure after the chain lookup is
    /// fatal: the manager stays in [`Phase::Errored`] and all later actions
    /// report [`LifecycleError::AdapterUnavailable`].
    pub async fn initialize(&self, chain_identifier: &str) -> Result<(), LifecycleError> {
        let shared = &self.shared;
        let chain = shared
            .registry
            .lookup(chain_identifier)
            .cloned()
            .ok_or_else(|| LifecycleError::UnknownChain(chain_identifier.to_string()))?;

        if shared.started.swap(true, Ordering::SeqCst) {
            return Err(LifecycleError::AlreadyInitialized);
        }

        let sdk = match (shared.build_sdk)(&chain) {
            Ok(sdk) => Arc::new(sdk),
            Err(e) => return Err(self.fail_initialization(e)),
        };

        for kind in &shared.adapters {
            if let Err(e) = sdk.configure_adapter(*kind) {
                tracing::warn!(adapter = %kind, error = %e, "Skipping wallet adapter");
            }
        }

        let (queue, inbox) = mpsc::unbounded_channel();
        let events = queue.clone();
        let source = Arc::downgrade(&sdk);
        sdk.subscribe(EventSink::new(move |event| {
            // The handle is read when the SDK emits, before any later event
            // can clear it.
            let handle = match &event {
                AuthEvent::Connected(_) => source.upgrade().and_then(|sdk| sdk.provider()),
                _ => None,
            };
            events.send(Envelope::Event { event, handle }).is_ok()
        }));

        let pump = EventPump::new(
            Arc::clone(&shared.bind_gateway),
            Arc::clone(&shared.state),
            queue.clone(),
            chain.chain_id.clone(),
        );
        tokio::spawn(pump.run(inbox, shared.shutdown.subscribe()));

        if let Err(e) = sdk.init().await {
            return Err(self.fail_initialization(e));
        }

        tracing::info!(
            chain = %chain.identifier,
            chain_id = %chain.chain_id,
            rpc_target = %chain.rpc_target,
            "Lifecycle manager initialized"
        );
        // `started` guarantees this is the only writer.
        let _ = shared.running.set(Running { sdk, chain, queue });
        Ok(())
    }

    fn fail_initialization(&self, err: SdkError) -> LifecycleError {
        tracing::error!(error = %err, "Wallet SDK initialization failed");
        self.shared.shutdown.trigger();
        self.shared.state.send_modify(|s| {
            s.phase = Phase::Errored;
            s.loading = false;
            s.last_error = Some(err.to_string());
        });
        LifecycleError::InitializationFailed(err)
    }

    /// Open a session through `adapter`.
    ///
    /// Loading is held for the whole attempt. A rejected or failed attempt
    /// leaves the manager in [`Phase::Errored`] and returns the SDK error.
    pub async fn login(&self, adapter: AdapterKind) -> Result<(), LifecycleError> {
        let running = self.running().ok_or(LifecycleError::AdapterUnavailable)?;
        running.request(|reply| Envelope::Login { reply }).await??;

        let _loading = LoadingGuard::engage(&self.shared.state);
        tracing::info!(adapter = %adapter, "Login requested");

        let outcome = running.sdk.connect_to(adapter).await;
        let result = outcome.as_ref().map(|_| ()).map_err(Clone::clone);
        running
            .request(|reply| Envelope::LoginSettled {
                adapter,
                outcome,
                reply,
            })
            .await?;

        if let Err(e) = &result {
            tracing::warn!(adapter = %adapter, error = %e, "Login failed");
        }
        result.map_err(LifecycleError::from)
    }

    /// Close the current session. Without one this is a no-op.
    pub async fn logout(&self) -> Result<LogoutOutcome, LifecycleError> {
        let Some(running) = self.running() else {
            tracing::warn!("Logout requested before initialization");
            return Ok(LogoutOutcome::NoActiveSession);
        };
        if !running.request(|reply| Envelope::SessionActive { reply }).await? {
            tracing::warn!("Logout requested without an active session");
            return Ok(LogoutOutcome::NoActiveSession);
        }

        let _loading = LoadingGuard::engage(&self.shared.state);
        let outcome = running.sdk.logout().await;
        running
            .request(|reply| Envelope::LogoutSettled {
                outcome: outcome.clone(),
                reply,
            })
            .await?;

        match outcome {
            Ok(()) => Ok(LogoutOutcome::Disconnected),
            // A concurrent logout closed the session first.
            Err(SdkError::NotConnected) => {
                tracing::debug!("Wallet session already closed");
                Ok(LogoutOutcome::NoActiveSession)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Re-query address and balance. Fails with
    /// [`LifecycleError::GatewayNotReady`] when no session is open or the
    /// session ends before the query completes.
    pub async fn refresh_account(&self) -> Result<AccountInfo, LifecycleError> {
        let running = self.running().ok_or(LifecycleError::GatewayNotReady)?;
        running.session_request(|reply| Envelope::Refresh { reply }).await
    }

    /// Whether a gateway is bound to an open session.
    pub async fn has_gateway(&self) -> bool {
        match self.running() {
            Some(running) => running
                .request(|reply| Envelope::GatewayBound { reply })
                .await
                .unwrap_or(false),
            None => false,
        }
    }

    /// Run `op` against the session's gateway inside the event pump's
    /// session scope. The operation is cancelled if the session ends.
    async fn with_gateway<T, F, Fut>(&self, op: F) -> Result<T, LifecycleError>
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn AccountGateway>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, GatewayError>> + Send + 'static,
    {
        let running = self.running().ok_or(LifecycleError::GatewayNotReady)?;
        running
            .session_request(|reply| {
                let job: GatewayJob = Box::new(move |gateway| {
                    Box::pin(async move {
                        let _ = reply.send(op(gateway).await.map_err(LifecycleError::from));
                    })
                });
                Envelope::Job { job }
            })
            .await
            .map_err(|e| match e {
                LifecycleError::Gateway(_) => self.record_error(e),
                other => other,
            })
    }

    /// Mint `token_id` on the `token` contract from the primary account.
    pub async fn purchase(&self, token: Address, token_id: U256) -> Result<TxHash, LifecycleError> {
        self.with_gateway(move |gateway| async move { gateway.sign_and_submit_purchase(token, token_id).await })
            .await
    }

    pub async fn transaction_status(&self, tx_hash: TxHash) -> Result<TransactionStatus, LifecycleError> {
        self.with_gateway(move |gateway| async move { gateway.get_transaction_status(tx_hash).await })
            .await
    }

    fn record_error(&self, err: LifecycleError) -> LifecycleError {
        tracing::warn!(error = %err, "Wallet action failed");
        self.shared.state.send_modify(|s| s.last_error = Some(err.to_string()));
        err
    }

    /// Resolves once everything queued before this call has been applied.
    pub async fn settled(&self) {
        if let Some(running) = self.running() {
            let _ = running.request(|reply| Envelope::Barrier { reply }).await;
        }
    }

    /// Log out if connected, then stop the event pump.
    pub async fn teardown(&self) {
        if self.state().connected() {
            if let Err(e) = self.logout().await {
                tracing::warn!(error = %e, "Logout during teardown failed");
            }
        }
        self.shared.shutdown.trigger();
        tracing::info!("Lifecycle manager stopped");
    }
}

impl LifecycleManager<AuthCore> {
    /// Manager backed by [`AuthCore`] and [`EthGateway`], with the chains and
    /// adapters from `config`.
    pub fn from_config(config: &SessionConfig) -> Result<Self, RegistryError> {
        let registry = ChainRegistry::with_entries(config.chains.iter().cloned())?;
        let settings = config.adapters.clone();
        let rpc = config.rpc.clone();

        Ok(Self::new(
            registry,
            config.enabled_adapters(),
            move |chain: &ChainConfig| Ok(AuthCore::new(chain.clone(), settings.clone(), &rpc)),
            |handle: ProviderHandle| Arc::new(EthGateway::new(handle)) as Arc<dyn AccountGateway>,
        ))
    }
}

impl<S: AuthSdk> std::fmt::Debug for LifecycleManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("chain", &self.chain().map(|c| c.identifier.as_str()))
            .field("state", &self.state())
            .finish()
    }
}
