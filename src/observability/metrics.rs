//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ledger_gateway_requests_total` (counter): gateway calls by route, outcome
//! - `ledger_broadcasts_total` (counter): broadcast attempts by operation
//! - `ledger_broadcast_duration_seconds` (histogram): broadcast latency
//! - `ledger_sequence_conflicts_total` (counter): conflicts by operation
//! - `ledger_submissions_total` (counter): finished submissions by operation, outcome

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_gateway_request(route: &str, success: bool) {
    let outcome = if success { "ok" } else { "error" };
    metrics::counter!(
        "ledger_gateway_requests_total",
        "route" => route.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_broadcast(operation: &'static str, start: Instant) {
    metrics::counter!("ledger_broadcasts_total", "operation" => operation).increment(1);
    metrics::histogram!("ledger_broadcast_duration_seconds", "operation" => operation)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_sequence_conflict(operation: &'static str) {
    metrics::counter!("ledger_sequence_conflicts_total", "operation" => operation).increment(1);
}

pub fn record_submission(operation: &'static str, outcome: &'static str) {
    metrics::counter!(
        "ledger_submissions_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}
