//! Broadcast result classification.
//!
//! # Outcomes
//! ```text
//! raw_log == SEQUENCE_MISMATCH_LOG        → SequenceConflict (any code)
//! (codespace, code) in configured list    → SequenceConflict
//! code != 0                               → Failed { code, codespace, raw_log }
//! otherwise                               → Succeeded
//! ```
//!
//! Only the sentinel text is ever compared against the raw log; every other
//! error is identified by the result code and its fields are passed through
//! untouched.

use serde::{Deserialize, Serialize};

use crate::ledger::events::BroadcastResult;

/// Raw log the ledger emits when an envelope carries a stale sequence.
pub const SEQUENCE_MISMATCH_LOG: &str =
    "unauthorized: signature verification failed; verify correct account sequence and chain-id";

/// Classification of a single broadcast attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Succeeded,
    /// Envelope was rejected before being applied; rebuild and resubmit.
    SequenceConflict,
    Failed {
        code: u32,
        codespace: String,
        raw_log: String,
    },
}

/// A `(codespace, code)` pair identifying a sequence conflict.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConflictCode {
    pub codespace: String,
    pub code: u32,
}

/// Classify using the sentinel text only.
pub fn classify(result: &BroadcastResult) -> Classification {
    Classifier::default().classify(result)
}

/// Result classifier with optional code-based conflict detection.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    conflict_codes: Vec<ConflictCode>,
}

impl Classifier {
    pub fn new(conflict_codes: Vec<ConflictCode>) -> Self {
        Self { conflict_codes }
    }

    pub fn classify(&self, result: &BroadcastResult) -> Classification {
        if result.raw_log == SEQUENCE_MISMATCH_LOG || self.is_conflict_code(result) {
            return Classification::SequenceConflict;
        }

        if result.is_tx_error() {
            return Classification::Failed {
                code: result.code,
                codespace: result.codespace.clone(),
                raw_log: result.raw_log.clone(),
            };
        }

        Classification::Succeeded
    }

    fn is_conflict_code(&self, result: &BroadcastResult) -> bool {
        result.is_tx_error()
            && self
                .conflict_codes
                .iter()
                .any(|c| c.code == result.code && c.codespace == result.codespace)
    }
}
