//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by outcome (success,
//!   failed, rejected)
//! - `relay_tx_attempts_total` (counter): submission attempts, retries
//!   included
//! - `relay_broadcasts_total` (counter): raw transactions broadcast
//! - `relay_active_sessions` (gauge): currently open sessions
//! - `relay_ledger_health` (gauge): 1=reachable, 0=unreachable

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics exporter"),
    }
}

/// Count one completed or rejected request by outcome.
pub fn record_request(outcome: &'static str) {
    metrics::counter!("relay_requests_total", "outcome" => outcome).increment(1);
}

/// Count one submission attempt (retries included).
pub fn record_attempt() {
    metrics::counter!("relay_tx_attempts_total").increment(1);
}

/// Count one raw transaction handed to the ledger.
pub fn record_broadcast() {
    metrics::counter!("relay_broadcasts_total").increment(1);
}

/// Track session open/close.
pub fn session_opened() {
    metrics::gauge!("relay_active_sessions").increment(1.0);
}

pub fn session_closed() {
    metrics::gauge!("relay_active_sessions").decrement(1.0);
}

/// Record ledger reachability.
pub fn record_ledger_health(healthy: bool) {
    metrics::gauge!("relay_ledger_health").set(if healthy { 1.0 } else { 0.0 });
}
