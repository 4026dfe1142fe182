//! In-memory scripted ledger (testing only).
//!
//! Broadcasts pop pre-scripted results in order. Account state is tracked the
//! way the ledger does it: every broadcast that succeeds or lands in a block
//! consumes one sequence. With [`MockLedger::enforce_sequence`] envelopes
//! signed with the wrong sequence are rejected with the mismatch sentinel
//! instead of consuming a script entry.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::ledger::classifier::SEQUENCE_MISMATCH_LOG;
use crate::ledger::client::LedgerClient;
use crate::ledger::events::{BroadcastResult, Event, MessageLog};
use crate::ledger::transaction::Envelope;
use crate::ledger::types::{AccountInfo, LedgerError, LedgerResult};

#[derive(Debug)]
struct MockState {
    account: AccountInfo,
    script: VecDeque<LedgerResult<BroadcastResult>>,
    broadcasts: Vec<Envelope>,
    contracts: HashMap<String, Value>,
    next_height: u64,
}

/// Scripted [`LedgerClient`] backed by in-process state.
#[derive(Debug)]
pub struct MockLedger {
    chain_id: String,
    enforce_sequence: bool,
    state: Mutex<MockState>,
}

impl MockLedger {
    pub fn new(chain_id: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            enforce_sequence: false,
            state: Mutex::new(MockState {
                account: AccountInfo {
                    account_number: 1,
                    sequence: 0,
                },
                script: VecDeque::new(),
                broadcasts: Vec::new(),
                contracts: HashMap::new(),
                next_height: 1,
            }),
        }
    }

    /// Reject envelopes whose sequence differs from the account's.
    pub fn enforce_sequence(mut self) -> Self {
        self.enforce_sequence = true;
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock ledger mutex poisoned")
    }

    /// Overwrite the account's sequence, e.g. to simulate another writer.
    pub fn set_sequence(&self, sequence: u64) {
        self.lock().account.sequence = sequence;
    }

    pub fn account_state(&self) -> AccountInfo {
        self.lock().account
    }

    /// Queue a broadcast result.
    pub fn push_result(&self, result: BroadcastResult) {
        self.lock().script.push_back(Ok(result));
    }

    /// Queue a transport failure.
    pub fn push_error(&self, error: LedgerError) {
        self.lock().script.push_back(Err(error));
    }

    /// Queue a successful result carrying `events`.
    pub fn push_success(&self, events: Vec<Event>) {
        let height = {
            let mut state = self.lock();
            state.next_height += 1;
            state.next_height - 1
        };
        self.push_result(BroadcastResult {
            height,
            txhash: format!("{:064X}", height),
            logs: Some(vec![MessageLog {
                msg_index: 0,
                log: String::new(),
                events,
            }]),
            ..Default::default()
        });
    }

    /// Queue the sequence-mismatch rejection.
    pub fn push_sequence_mismatch(&self) {
        self.push_result(sequence_mismatch());
    }

    /// Answer smart queries against `contract` with `response`.
    pub fn set_query_response(&self, contract: impl Into<String>, response: Value) {
        self.lock().contracts.insert(contract.into(), response);
    }

    /// Every envelope broadcast so far, in order.
    pub fn broadcasts(&self) -> Vec<Envelope> {
        self.lock().broadcasts.clone()
    }

    pub fn broadcast_count(&self) -> usize {
        self.lock().broadcasts.len()
    }
}

fn sequence_mismatch() -> BroadcastResult {
    BroadcastResult {
        code: 4,
        codespace: "sdk".to_string(),
        raw_log: SEQUENCE_MISMATCH_LOG.to_string(),
        ..Default::default()
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn broadcast(&self, envelope: &Envelope) -> LedgerResult<BroadcastResult> {
        let mut state = self.lock();
        state.broadcasts.push(envelope.clone());

        if self.enforce_sequence && envelope.sequence() != state.account.sequence {
            return Ok(sequence_mismatch());
        }

        let result = state
            .script
            .pop_front()
            .unwrap_or_else(|| Err(LedgerError::Rpc("mock ledger has no scripted response".to_string())))?;

        if result.raw_log != SEQUENCE_MISMATCH_LOG && (!result.is_tx_error() || result.included_in_block()) {
            state.account.sequence += 1;
        }
        Ok(result)
    }

    async fn account(&self, _address: &str) -> LedgerResult<AccountInfo> {
        Ok(self.lock().account)
    }

    async fn chain_id(&self) -> LedgerResult<String> {
        Ok(self.chain_id.clone())
    }

    async fn query_contract(&self, contract: &str, _msg: &Value) -> LedgerResult<Value> {
        self.lock()
            .contracts
            .get(contract)
            .cloned()
            .ok_or_else(|| LedgerError::Rpc(format!("HTTP 404 Not Found: contract {} not found", contract)))
    }
}
