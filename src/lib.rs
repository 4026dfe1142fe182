//! Signed transaction submission for a CosmWasm ledger.
//!
//! Builds and signs envelopes for code uploads, contract instantiation and
//! contract execution, broadcasts them through the ledger's REST gateway,
//! classifies the outcome and extracts identifiers from the event log.
//! Sequence conflicts are retried with bounded exponential backoff.

// Core subsystem
pub mod ledger;

// Cross-cutting concerns
pub mod config;
pub mod observability;
pub mod resilience;

pub use config::schema::SubmitterConfig;
pub use ledger::{LedgerError, LedgerResult, Submitter};
