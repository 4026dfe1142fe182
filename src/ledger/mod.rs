//! Ledger submission subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private key)
//!     → wallet.rs (key loading, sequence tracking, signing)
//!     → transaction.rs (operation payloads, signed envelopes)
//!     → client.rs (gateway calls with timeouts and failover)
//!     → classifier.rs (success / sequence conflict / failure)
//!     → events.rs (event log extraction)
//!     → submitter.rs (session: build, broadcast, classify, retry)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All gateway calls have configurable timeouts

pub mod classifier;
pub mod client;
pub mod events;
pub mod mock;
pub mod submitter;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use classifier::{Classification, Classifier, SEQUENCE_MISMATCH_LOG};
pub use client::{HttpLedgerClient, LedgerClient};
pub use events::{BroadcastResult, Event, EventLog, ExtractionTarget};
pub use mock::MockLedger;
pub use submitter::{Submission, Submitter};
pub use transaction::{Envelope, EnvelopeBuilder, Operation, OperationKind};
pub use types::{AccountInfo, Coin, Coins, FeeBudget, LedgerError, LedgerResult};
pub use wallet::Wallet;
