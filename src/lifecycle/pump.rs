//! Event pump: the single owner of the wallet session.
//!
//! SDK events and manager commands share one FIFO queue. Each item is
//! handled to completion before the next is read, so a `connected` event is
//! fully applied (gateway bound, account fetch started) before a following
//! `disconnected` is observed.
//!
//! Work that needs the gateway runs in tasks owned by the pump. Ending a
//! session aborts them, so no gateway instance outlives its session.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::gateway::{fetch_account, AccountGateway, AccountInfo, GatewayResult};
use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::manager::GatewayBinder;
use crate::lifecycle::state::{LifecycleState, Phase};
use crate::observability::metrics;
use crate::sdk::{AdapterKind, AuthEvent, SdkError, SessionInfo};

/// Operation run against the bound gateway.
pub(crate) type GatewayJob =
    Box<dyn FnOnce(Arc<dyn AccountGateway>) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

pub(crate) type AccountReply = oneshot::Sender<Result<AccountInfo, LifecycleError>>;

/// Items processed by the pump. `H` is the SDK's connection handle.
pub(crate) enum Envelope<H> {
    /// SDK event, with the provider handle captured when it was emitted.
    Event { event: AuthEvent, handle: Option<H> },
    /// Admission check for a login; moves the phase to `Connecting`.
    Login {
        reply: oneshot::Sender<Result<(), LifecycleError>>,
    },
    /// `connect_to` returned; queued after every event it emitted.
    LoginSettled {
        adapter: AdapterKind,
        outcome: Result<H, SdkError>,
        reply: oneshot::Sender<()>,
    },
    SessionActive {
        reply: oneshot::Sender<bool>,
    },
    LogoutSettled {
        outcome: Result<(), SdkError>,
        reply: oneshot::Sender<()>,
    },
    GatewayBound {
        reply: oneshot::Sender<bool>,
    },
    /// Run `job` in a session task. Dropped unrun when no gateway is bound.
    Job { job: GatewayJob },
    Refresh { reply: AccountReply },
    /// Account fetch result, tagged with the session epoch it was started in.
    Account {
        epoch: u64,
        outcome: GatewayResult<AccountInfo>,
        reply: Option<AccountReply>,
    },
    Barrier {
        reply: oneshot::Sender<()>,
    },
}

pub(crate) struct EventPump<H> {
    bind_gateway: GatewayBinder<H>,
    state: Arc<watch::Sender<LifecycleState>>,
    queue: mpsc::UnboundedSender<Envelope<H>>,
    chain_id: String,
    gateway: Option<Arc<dyn AccountGateway>>,
    tasks: Vec<JoinHandle<()>>,
    epoch: u64,
}

impl<H: Send + Sync + 'static> EventPump<H> {
    pub(crate) fn new(
        bind_gateway: GatewayBinder<H>,
        state: Arc<watch::Sender<LifecycleState>>,
        queue: mpsc::UnboundedSender<Envelope<H>>,
        chain_id: String,
    ) -> Self {
        Self {
            bind_gateway,
            state,
            queue,
            chain_id,
            gateway: None,
            tasks: Vec::new(),
            epoch: 0,
        }
    }

    pub(crate) async fn run(
        mut self,
        mut inbox: mpsc::UnboundedReceiver<Envelope<H>>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        tracing::debug!(chain_id = %self.chain_id, "Lifecycle event pump started");

        loop {
            tokio::select! {
                envelope = inbox.recv() => match envelope {
                    Some(envelope) => self.dispatch(envelope),
                    None => break,
                },
                _ = shutdown.recv() => {
                    tracing::debug!("Lifecycle event pump received shutdown signal");
                    break;
                }
            }
        }

        if self.gateway.is_some() {
            self.on_disconnected();
        }
        self.end_session();
        tracing::debug!("Lifecycle event pump stopped");
    }

    fn phase(&self) -> Phase {
        self.state.borrow().phase
    }

    fn dispatch(&mut self, envelope: Envelope<H>) {
        match envelope {
            Envelope::Event { event, handle } => self.handle_event(event, handle),
            Envelope::Login { reply } => {
                let _ = reply.send(self.admit_login());
            }
            Envelope::LoginSettled {
                adapter,
                outcome,
                reply,
            } => {
                self.settle_login(adapter, outcome);
                let _ = reply.send(());
            }
            Envelope::SessionActive { reply } => {
                let _ = reply.send(self.phase() == Phase::Connected);
            }
            Envelope::LogoutSettled { outcome, reply } => {
                self.settle_logout(outcome);
                let _ = reply.send(());
            }
            Envelope::GatewayBound { reply } => {
                let _ = reply.send(self.gateway.is_some());
            }
            Envelope::Job { job } => {
                if let Some(gateway) = &self.gateway {
                    let task = tokio::spawn(job(Arc::clone(gateway)));
                    self.track(task);
                }
            }
            Envelope::Refresh { reply } => match &self.gateway {
                Some(gateway) => self.spawn_account_fetch(Arc::clone(gateway), Some(reply)),
                None => {
                    let _ = reply.send(Err(LifecycleError::GatewayNotReady));
                }
            },
            Envelope::Account {
                epoch,
                outcome,
                reply,
            } => {
                let applied = self.apply_account(epoch, &outcome);
                if let Some(reply) = reply {
                    let result = if applied {
                        outcome.map_err(LifecycleError::from)
                    } else {
                        Err(LifecycleError::GatewayNotReady)
                    };
                    let _ = reply.send(result);
                }
            }
            Envelope::Barrier { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn handle_event(&mut self, event: AuthEvent, handle: Option<H>) {
        let label = event.label();
        metrics::record_lifecycle_event(label);
        tracing::debug!(event = label, phase = %self.phase(), "Processing lifecycle event");

        match event {
            AuthEvent::Connecting => self.on_connecting(),
            AuthEvent::Connected(info) => match handle {
                Some(handle) => self.on_connected(info, handle),
                None => self.on_errored(SdkError::MissingProvider),
            },
            AuthEvent::Disconnected => self.on_disconnected(),
            AuthEvent::Errored(err) => self.on_errored(err),
        }
    }

    fn admit_login(&mut self) -> Result<(), LifecycleError> {
        match self.phase() {
            Phase::Connecting => Err(LifecycleError::LoginInProgress),
            Phase::Connected => Err(LifecycleError::AlreadyConnected),
            Phase::Idle | Phase::Disconnected | Phase::Errored => {
                self.state.send_modify(|s| {
                    s.phase = Phase::Connecting;
                    s.last_error = None;
                });
                Ok(())
            }
        }
    }

    fn settle_login(&mut self, adapter: AdapterKind, outcome: Result<H, SdkError>) {
        metrics::record_login(adapter, outcome.is_ok());
        // Events emitted by connect_to were handled already; only a missing
        // terminal event leaves the phase at Connecting.
        if self.phase() != Phase::Connecting {
            return;
        }
        match outcome {
            Ok(handle) => self.on_connected(SessionInfo::new(adapter, self.chain_id.clone()), handle),
            Err(err) => self.on_errored(err),
        }
    }

    fn settle_logout(&mut self, outcome: Result<(), SdkError>) {
        match outcome {
            // NotConnected: a concurrent logout already closed the SDK session.
            Ok(()) | Err(SdkError::NotConnected) => {
                if self.phase() == Phase::Connected {
                    self.on_disconnected();
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "Wallet logout failed");
                self.state.send_modify(|s| s.last_error = Some(err.to_string()));
            }
        }
    }

    fn on_connecting(&mut self) {
        if self.phase() == Phase::Connected {
            tracing::debug!("Ignoring connecting event for an open session");
            return;
        }
        self.state.send_modify(|s| {
            s.phase = Phase::Connecting;
            s.loading = true;
        });
    }

    fn on_connected(&mut self, info: SessionInfo, handle: H) {
        self.end_session();
        let gateway = (self.bind_gateway)(handle);
        self.gateway = Some(Arc::clone(&gateway));

        tracing::info!(
            session_id = %info.session_id,
            adapter = %info.adapter,
            chain_id = %info.chain_id,
            "Wallet connected"
        );
        self.state.send_modify(|s| {
            s.phase = Phase::Connected;
            s.loading = false;
            s.clear_session();
            s.session = Some(info);
            s.last_error = None;
        });
        metrics::record_connected(true);

        self.spawn_account_fetch(gateway, None);
    }

    fn on_disconnected(&mut self) {
        self.end_session();
        tracing::info!("Wallet disconnected");
        self.state.send_modify(|s| {
            s.phase = Phase::Disconnected;
            s.loading = false;
            s.clear_session();
        });
        metrics::record_connected(false);
    }

    fn on_errored(&mut self, err: SdkError) {
        self.end_session();
        tracing::warn!(error = %err, "Wallet error or cancelled login");
        self.state.send_modify(|s| {
            s.phase = Phase::Errored;
            s.loading = false;
            s.clear_session();
            s.last_error = Some(err.to_string());
        });
        metrics::record_connected(false);
    }

    /// Drop the gateway and abort every task still using it.
    fn end_session(&mut self) {
        self.epoch += 1;
        self.gateway = None;
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    fn track(&mut self, task: JoinHandle<()>) {
        self.tasks.retain(|t| !t.is_finished());
        self.tasks.push(task);
    }

    fn spawn_account_fetch(&mut self, gateway: Arc<dyn AccountGateway>, reply: Option<AccountReply>) {
        let epoch = self.epoch;
        let queue = self.queue.clone();
        let task = tokio::spawn(async move {
            let outcome = fetch_account(gateway.as_ref()).await;
            drop(gateway);
            let _ = queue.send(Envelope::Account {
                epoch,
                outcome,
                reply,
            });
        });
        self.track(task);
    }

    /// Returns whether the result belonged to the open session.
    fn apply_account(&mut self, epoch: u64, outcome: &GatewayResult<AccountInfo>) -> bool {
        if epoch != self.epoch || self.phase() != Phase::Connected {
            tracing::debug!(epoch, current = self.epoch, "Discarding account data from a closed session");
            return false;
        }
        match outcome {
            Ok(info) => {
                tracing::debug!(address = %info.address, balance = %info.balance, "Account details updated");
                let info = info.clone();
                self.state.send_modify(|s| {
                    s.account_address = Some(info.address);
                    s.account_balance = Some(info.balance);
                });
            }
            Err(err) => {
                tracing::warn!(error = %err, "Account details unavailable");
                self.state.send_modify(|s| s.last_error = Some(err.to_string()));
            }
        }
        true
    }
}
