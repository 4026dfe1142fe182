//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the submitter.
//! All types derive Serde traits for deserialization from config files.
//! The signing key is deliberately absent: it is read from the environment.

use serde::{Deserialize, Serialize};

use crate::ledger::classifier::ConflictCode;
use crate::ledger::types::{FeeBudget, LedgerResult};
use crate::ledger::wallet::PRIVATE_KEY_ENV_VAR;

/// Root configuration for a submission session.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SubmitterConfig {
    /// Ledger gateway settings.
    pub ledger: LedgerConfig,

    /// Signing identity settings.
    pub signer: SignerConfig,

    /// Sequence-conflict retry settings.
    pub retries: RetryConfig,

    /// Default fee budgets per operation kind.
    pub fees: FeeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Ledger gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON REST gateway URL.
    pub lcd_url: String,

    /// Failover gateway URLs.
    pub failover_urls: Vec<String>,

    /// Chain ID signed into every envelope (e.g. "bombay-10").
    pub chain_id: String,

    /// Per-request and per-broadcast-attempt timeout in seconds.
    pub request_timeout_secs: u64,

    /// Broadcast mode passed to the gateway. Must be "block": only block
    /// mode results carry the event log.
    pub broadcast_mode: String,

    /// Check the gateway's chain ID when a session connects.
    pub verify_chain_id: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lcd_url: "https://bombay-lcd.terra.dev".to_string(),
            failover_urls: Vec::new(),
            chain_id: "bombay-10".to_string(),
            request_timeout_secs: 60,
            broadcast_mode: "block".to_string(),
            verify_chain_id: true,
        }
    }
}

/// Signing identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Environment variable holding the hex private key.
    pub private_key_env: String,

    /// Account address on the ledger, when it differs from the key's hex address.
    pub account_address: Option<String>,

    /// Memo attached to every envelope.
    pub memo: String,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            private_key_env: PRIVATE_KEY_ENV_VAR.to_string(),
            account_address: None,
            memo: String::new(),
        }
    }
}

/// Retry configuration for sequence conflicts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of broadcasts per submission, including the first.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Result codes treated as sequence conflicts in addition to the
    /// mismatch sentinel log.
    pub sequence_conflict_codes: Vec<ConflictCode>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 250,
            max_delay_ms: 4000,
            sequence_conflict_codes: Vec::new(),
        }
    }
}

/// Gas limit and fee amount for one operation kind.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FeeSetting {
    pub gas_limit: u64,

    /// Compact coin list, e.g. "20000000uusd".
    pub amount: String,
}

impl FeeSetting {
    pub fn new(gas_limit: u64, amount: &str) -> Self {
        Self {
            gas_limit,
            amount: amount.to_string(),
        }
    }

    pub fn to_budget(&self) -> LedgerResult<FeeBudget> {
        FeeBudget::new(self.gas_limit, &self.amount)
    }
}

/// Default fee budgets used when a caller does not pass one.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeeConfig {
    pub store_code: FeeSetting,
    pub instantiate: FeeSetting,
    pub execute: FeeSetting,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            store_code: FeeSetting::new(10_000_000, "20000000uusd"),
            instantiate: FeeSetting::new(5_000_000, "1000000uusd"),
            execute: FeeSetting::new(5_000_000, "1000000uusd"),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format ("pretty" or "json").
    pub log_format: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
