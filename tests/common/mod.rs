//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{address, Address, TxHash, U256};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Notify;

use wallet_session::chain::{ChainConfig, ChainRegistry};
use wallet_session::gateway::{AccountGateway, Balance, GatewayError, GatewayResult, TransactionStatus};
use wallet_session::sdk::{AdapterKind, AuthEvent, AuthSdk, EventSink, SdkError, SessionInfo};
use wallet_session::LifecycleManager;

pub const MOCK_ACCOUNT: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
pub const MOCK_BALANCE_WEI: u128 = 2_250_000_000_000_000_000;

// ---------------------------------------------------------------------------
// Mock auth SDK
// ---------------------------------------------------------------------------

/// Connection handle issued by [`MockSdk`].
#[derive(Debug, Clone)]
pub struct MockHandle {
    pub adapter: AdapterKind,
}

/// Scriptable [`AuthSdk`]. Clones share state.
#[derive(Clone, Default)]
pub struct MockSdk {
    inner: Arc<MockInner>,
}

#[derive(Default)]
struct MockInner {
    chain: Mutex<Option<ChainConfig>>,
    configured: Mutex<Vec<AdapterKind>>,
    sink: Mutex<Option<EventSink>>,
    subscriptions: AtomicUsize,
    provider: Mutex<Option<MockHandle>>,
    fail_init: AtomicBool,
    connect_error: Mutex<Option<SdkError>>,
    hold_connect: Mutex<Option<Arc<Notify>>>,
}

impl MockSdk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain the SDK was built for.
    pub fn chain(&self) -> Option<ChainConfig> {
        self.inner.chain.lock().unwrap().clone()
    }

    pub fn configured(&self) -> Vec<AdapterKind> {
        self.inner.configured.lock().unwrap().clone()
    }

    pub fn subscriptions(&self) -> usize {
        self.inner.subscriptions.load(Ordering::SeqCst)
    }

    pub fn fail_init(&self) {
        self.inner.fail_init.store(true, Ordering::SeqCst);
    }

    pub fn fail_connect(&self, err: Option<SdkError>) {
        *self.inner.connect_error.lock().unwrap() = err;
    }

    /// Make `connect_to` wait after emitting `Connecting` until `gate` is notified.
    pub fn hold_connect(&self, gate: Arc<Notify>) {
        *self.inner.hold_connect.lock().unwrap() = Some(gate);
    }

    pub fn set_provider(&self, adapter: Option<AdapterKind>) {
        *self.inner.provider.lock().unwrap() = adapter.map(|adapter| MockHandle { adapter });
    }

    /// Deliver an event as if the SDK raised it on its own.
    pub fn emit(&self, event: AuthEvent) {
        let sink = self.inner.sink.lock().unwrap().clone();
        if let Some(sink) = sink {
            sink.emit(event);
        }
    }

    fn record_chain(&self, chain: &ChainConfig) {
        *self.inner.chain.lock().unwrap() = Some(chain.clone());
    }
}

#[async_trait]
impl AuthSdk for MockSdk {
    type Handle = MockHandle;

    fn configure_adapter(&self, kind: AdapterKind) -> Result<(), SdkError> {
        self.inner.configured.lock().unwrap().push(kind);
        Ok(())
    }

    fn subscribe(&self, sink: EventSink) {
        self.inner.subscriptions.fetch_add(1, Ordering::SeqCst);
        *self.inner.sink.lock().unwrap() = Some(sink);
    }

    async fn init(&self) -> Result<(), SdkError> {
        if self.inner.fail_init.load(Ordering::SeqCst) {
            return Err(SdkError::Initialization("mock init failure".to_string()));
        }
        Ok(())
    }

    async fn connect_to(&self, adapter: AdapterKind) -> Result<MockHandle, SdkError> {
        self.emit(AuthEvent::Connecting);

        let gate = self.inner.hold_connect.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let failure = self.inner.connect_error.lock().unwrap().clone();
        if let Some(err) = failure {
            self.emit(AuthEvent::Errored(err.clone()));
            return Err(err);
        }

        self.set_provider(Some(adapter));
        let chain_id = self.chain().map(|c| c.chain_id).unwrap_or_default();
        self.emit(AuthEvent::Connected(SessionInfo::new(adapter, chain_id)));
        Ok(MockHandle { adapter })
    }

    async fn logout(&self) -> Result<(), SdkError> {
        let previous = self.inner.provider.lock().unwrap().take();
        match previous {
            Some(_) => {
                self.emit(AuthEvent::Disconnected);
                Ok(())
            }
            None => Err(SdkError::NotConnected),
        }
    }

    fn provider(&self) -> Option<MockHandle> {
        self.inner.provider.lock().unwrap().clone()
    }
}

// ---------------------------------------------------------------------------
// Mock account gateway
// ---------------------------------------------------------------------------

/// Counts live [`MockGateway`] instances.
#[derive(Clone, Default)]
pub struct GatewayCounter {
    live: Arc<AtomicUsize>,
    created: Arc<AtomicUsize>,
    gate: Arc<Mutex<Option<Arc<Notify>>>>,
}

impl GatewayCounter {
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Gateways created from now on wait for `gate` before answering `get_accounts`.
    pub fn gate_accounts(&self, gate: Arc<Notify>) {
        *self.gate.lock().unwrap() = Some(gate);
    }

    /// Yield until the live count reaches `expected`.
    pub async fn wait_for_live(&self, expected: usize) -> bool {
        for _ in 0..1000 {
            if self.live() == expected {
                return true;
            }
            tokio::task::yield_now().await;
        }
        self.live() == expected
    }

    pub fn bind(&self) -> Arc<dyn AccountGateway> {
        self.live.fetch_add(1, Ordering::SeqCst);
        self.created.fetch_add(1, Ordering::SeqCst);
        Arc::new(MockGateway {
            live: Arc::clone(&self.live),
            gate: self.gate.lock().unwrap().clone(),
        })
    }
}

pub struct MockGateway {
    live: Arc<AtomicUsize>,
    gate: Option<Arc<Notify>>,
}

impl Drop for MockGateway {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountGateway for MockGateway {
    async fn get_accounts(&self) -> GatewayResult<Address> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(MOCK_ACCOUNT)
    }

    async fn get_balance(&self) -> GatewayResult<Balance> {
        Ok(Balance::from_wei(U256::from(MOCK_BALANCE_WEI)))
    }

    async fn sign_and_submit_purchase(&self, _token: Address, token_id: U256) -> GatewayResult<TxHash> {
        if token_id.is_zero() {
            return Err(GatewayError::TransactionRejected("User denied transaction signature".to_string()));
        }
        Ok(TxHash::repeat_byte(0xab))
    }

    async fn get_transaction_status(&self, _tx_hash: TxHash) -> GatewayResult<TransactionStatus> {
        Ok(TransactionStatus::Pending)
    }
}

/// Manager over `sdk` on the built-in chains, binding gateways through `gateways`.
pub fn mock_manager(sdk: &MockSdk, gateways: &GatewayCounter) -> LifecycleManager<MockSdk> {
    let sdk = sdk.clone();
    let gateways = gateways.clone();
    LifecycleManager::new(
        ChainRegistry::builtin(),
        vec![AdapterKind::Metamask, AdapterKind::TorusEvm, AdapterKind::WalletConnectV1],
        move |chain: &ChainConfig| {
            sdk.record_chain(chain);
            Ok(sdk.clone())
        },
        move |_handle: MockHandle| gateways.bind(),
    )
}

// ---------------------------------------------------------------------------
// Mock JSON-RPC backend
// ---------------------------------------------------------------------------

/// JSON-RPC error returned by a programmable backend: (code, message).
pub type RpcFailure = (i64, String);

/// Start a JSON-RPC backend on an ephemeral port. `handler` receives the
/// method and params of every call.
pub async fn start_rpc_backend<F, Fut>(handler: F) -> SocketAddr
where
    F: Fn(String, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, RpcFailure>> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_json_body(&mut socket).await else {
                            return;
                        };
                        let id = request.get("id").cloned().unwrap_or(Value::Null);
                        let method = request["method"].as_str().unwrap_or_default().to_string();
                        let params = request.get("params").cloned().unwrap_or(Value::Null);

                        let body = match handler(method, params).await {
                            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
                            Err((code, message)) => json!({
                                "jsonrpc": "2.0",
                                "id": id,
                                "error": { "code": code, "message": message }
                            }),
                        }
                        .to_string();

                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_json_body(socket: &mut tokio::net::TcpStream) -> Option<Value> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    serde_json::from_slice(&buf[header_end..]).ok()
}
