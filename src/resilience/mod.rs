//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Submission attempt:
//!     → timeouts.rs (deadline on the broadcast)
//!     → On sequence conflict: retries.rs (attempt budget, exponential
//!       delay with jitter before rebuild)
//! ```
//!
//! Only sequence conflicts are retried. Transport failures and ledger
//! rejections surface immediately, since a broadcast is not idempotent.

pub mod retries;
pub mod timeouts;
