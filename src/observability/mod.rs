//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Submitter, ledger client:
//!     → logging.rs (structured log events, one span per submission)
//!     → metrics.rs (broadcast, conflict and outcome counters)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields over formatted messages
//! - A submission id flows through every event of one submission
//! - Metric calls are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;

use std::net::SocketAddr;

use crate::config::ObservabilityConfig;

/// Install logging and, when enabled, the Prometheus exporter.
///
/// Must be called from within a Tokio runtime when metrics are enabled.
pub fn init(config: &ObservabilityConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    logging::init_logging(config)?;

    if config.metrics_enabled {
        match config.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::warn!(
                address = %config.metrics_address,
                error = %e,
                "Invalid metrics address, exporter disabled"
            ),
        }
    }
    Ok(())
}
