//! Configuration validation.
//!
//! Serde handles syntax; this checks values: URLs parse, timeouts and budgets
//! are positive, fee settings parse into valid budgets. Every problem is
//! reported, not just the first.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{FeeSetting, SubmitterConfig};

/// Only block mode returns the event log that code ids and contract
/// addresses are extracted from.
const BROADCAST_MODES: [&str; 1] = ["block"];
const LOG_FORMATS: [&str; 2] = ["pretty", "json"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &SubmitterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let ledger = &config.ledger;
    if let Err(e) = url::Url::parse(&ledger.lcd_url) {
        errors.push(ValidationError::new("ledger.lcd_url", e.to_string()));
    }
    for (i, failover) in ledger.failover_urls.iter().enumerate() {
        if let Err(e) = url::Url::parse(failover) {
            errors.push(ValidationError::new(format!("ledger.failover_urls[{}]", i), e.to_string()));
        }
    }
    if ledger.chain_id.trim().is_empty() {
        errors.push(ValidationError::new("ledger.chain_id", "must not be empty"));
    }
    if ledger.request_timeout_secs == 0 {
        errors.push(ValidationError::new("ledger.request_timeout_secs", "must be positive"));
    }
    if !BROADCAST_MODES.contains(&ledger.broadcast_mode.as_str()) {
        errors.push(ValidationError::new(
            "ledger.broadcast_mode",
            format!("must be one of {:?}", BROADCAST_MODES),
        ));
    }

    if config.signer.private_key_env.trim().is_empty() {
        errors.push(ValidationError::new("signer.private_key_env", "must not be empty"));
    }

    let retries = &config.retries;
    if retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be at least 1"));
    }
    if retries.base_delay_ms > retries.max_delay_ms {
        errors.push(ValidationError::new(
            "retries.base_delay_ms",
            "must not exceed retries.max_delay_ms",
        ));
    }

    check_fee(&mut errors, "fees.store_code", &config.fees.store_code);
    check_fee(&mut errors, "fees.instantiate", &config.fees.instantiate);
    check_fee(&mut errors, "fees.execute", &config.fees.execute);

    let observability = &config.observability;
    if !LOG_FORMATS.contains(&observability.log_format.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("must be one of {:?}", LOG_FORMATS),
        ));
    }
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_fee(errors: &mut Vec<ValidationError>, field: &str, fee: &FeeSetting) {
    if let Err(e) = fee.to_budget() {
        errors.push(ValidationError::new(field, e.to_string()));
    }
}
