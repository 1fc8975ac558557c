//! Metrics collection and exposition.
//!
//! # Metrics
//! - `wallet_lifecycle_events_total` (counter): SDK events by kind
//! - `wallet_login_attempts_total` (counter): login attempts by adapter and outcome
//! - `wallet_gateway_calls_total` (counter): gateway calls by operation and outcome
//! - `wallet_session_connected` (gauge): 1=connected, 0=not connected

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::sdk::AdapterKind;

/// Install the Prometheus recorder with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_lifecycle_event(event: &'static str) {
    counter!("wallet_lifecycle_events_total", "event" => event).increment(1);
}

pub fn record_login(adapter: AdapterKind, success: bool) {
    counter!(
        "wallet_login_attempts_total",
        "adapter" => adapter.as_str(),
        "outcome" => outcome(success)
    )
    .increment(1);
}

pub fn record_gateway_call(operation: &'static str, success: bool) {
    counter!(
        "wallet_gateway_calls_total",
        "operation" => operation,
        "outcome" => outcome(success)
    )
    .increment(1);
}

pub fn record_connected(connected: bool) {
    gauge!("wallet_session_connected").set(if connected { 1.0 } else { 0.0 });
}

fn outcome(success: bool) -> &'static str {
    if success {
        "ok"
    } else {
        "error"
    }
}
