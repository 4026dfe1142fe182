//! Transaction submission session.
//!
//! # States
//! ```text
//! Building → Broadcasting → Classifying → { Succeeded, Retrying, Failed }
//!
//! Building:      refresh account state, sign a fresh envelope
//! Broadcasting:  one broadcast under the per-attempt deadline
//! Classifying:   Succeeded  → extract target (missing target is fatal)
//!                Retrying   → sequence conflict; back off, reset the
//!                             sequence to the ledger's, rebuild
//!                Failed     → rejection or transport failure, surfaced as is
//! ```
//!
//! A session owns one signing identity. Submissions on the same session are
//! serialized for the whole retry loop; separate sessions run independently.

use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::schema::{FeeConfig, FeeSetting, SubmitterConfig};
use crate::ledger::classifier::{Classification, Classifier};
use crate::ledger::client::{HttpLedgerClient, LedgerClient};
use crate::ledger::events::ExtractionTarget;
use crate::ledger::transaction::{EnvelopeBuilder, Operation};
use crate::ledger::types::{Coins, FeeBudget, LedgerError, LedgerResult};
use crate::ledger::wallet::Wallet;
use crate::observability::metrics;
use crate::resilience::retries::RetryPolicy;
use crate::resilience::timeouts::with_deadline;

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub txhash: String,
    pub height: u64,
    pub gas_used: u64,
    /// Broadcasts it took, including conflicts.
    pub attempts: u32,
    /// Extracted attribute value, when a target was requested.
    pub value: Option<String>,
}

/// Submission session: ledger client, signing identity and policies.
pub struct Submitter {
    client: Arc<dyn LedgerClient>,
    wallet: Wallet,
    builder: EnvelopeBuilder,
    classifier: Classifier,
    policy: RetryPolicy,
    fees: FeeConfig,
    /// Deadline per broadcast attempt in seconds; 0 disables it.
    attempt_timeout_secs: u64,
    serial: Mutex<()>,
}

impl Submitter {
    /// Create a session with default policies.
    pub fn new(client: Arc<dyn LedgerClient>, wallet: Wallet) -> Self {
        Self {
            client,
            wallet,
            builder: EnvelopeBuilder::new(),
            classifier: Classifier::default(),
            policy: RetryPolicy::default(),
            fees: FeeConfig::default(),
            attempt_timeout_secs: 0,
            serial: Mutex::new(()),
        }
    }

    /// Build a session from configuration: gateway client, chain check and
    /// the signing key from the configured environment variable.
    pub async fn connect(config: &SubmitterConfig) -> LedgerResult<Self> {
        let client = HttpLedgerClient::new(config.ledger.clone())?;

        if config.ledger.verify_chain_id {
            match client.verify_chain_id().await {
                Ok(()) => {}
                Err(e @ LedgerError::ChainMismatch { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, "Chain verification failed, continuing");
                }
            }
        }

        let mut wallet =
            Wallet::from_env(&config.signer.private_key_env, config.ledger.chain_id.clone())?;
        if let Some(account) = &config.signer.account_address {
            wallet = wallet.with_account(account.clone());
        }

        Ok(Self::new(Arc::new(client), wallet)
            .with_builder(EnvelopeBuilder::with_memo(config.signer.memo.clone()))
            .with_classifier(Classifier::new(config.retries.sequence_conflict_codes.clone()))
            .with_retry_policy(RetryPolicy::from_config(&config.retries))
            .with_fees(config.fees.clone())
            .with_attempt_timeout(config.ledger.request_timeout_secs))
    }

    pub fn with_builder(mut self, builder: EnvelopeBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_fees(mut self, fees: FeeConfig) -> Self {
        self.fees = fees;
        self
    }

    pub fn with_attempt_timeout(mut self, secs: u64) -> Self {
        self.attempt_timeout_secs = secs;
        self
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    /// Upload bytecode and return its code id.
    pub async fn deploy_code(&self, bytecode: Vec<u8>, fee: Option<FeeBudget>) -> LedgerResult<u64> {
        let target = ExtractionTarget::code_id();
        let fee = self.fee_or_default(fee, &self.fees.store_code)?;
        let submission = self
            .submit(Operation::StoreCode { wasm_byte_code: bytecode }, fee, Some(&target))
            .await?;

        let value = extracted(&submission, &target)?;
        let code_id = value.parse::<u64>().map_err(|_| LedgerError::MalformedValue {
            txhash: submission.txhash.clone(),
            attribute_key: target.attribute_key.clone(),
            value: value.clone(),
        })?;

        tracing::info!(code_id = code_id, txhash = %submission.txhash, "Code uploaded");
        Ok(code_id)
    }

    /// Read a bytecode file and upload it.
    pub async fn deploy_code_file(
        &self,
        path: impl AsRef<Path>,
        fee: Option<FeeBudget>,
    ) -> LedgerResult<u64> {
        let path = path.as_ref();
        let bytecode = tokio::fs::read(path).await?;
        tracing::debug!(path = %path.display(), bytes = bytecode.len(), "Read bytecode");
        self.deploy_code(bytecode, fee).await
    }

    /// Instantiate a contract from `code_id` and return its address.
    pub async fn instantiate(
        &self,
        code_id: u64,
        init_msg: Value,
        migratable: bool,
        fee: Option<FeeBudget>,
    ) -> LedgerResult<String> {
        let target = ExtractionTarget::contract_address();
        let fee = self.fee_or_default(fee, &self.fees.instantiate)?;
        let operation = Operation::Instantiate {
            code_id,
            init_msg,
            migratable,
            init_coins: Coins::empty(),
        };
        let submission = self.submit(operation, fee, Some(&target)).await?;

        let address = extracted(&submission, &target)?;
        tracing::info!(code_id = code_id, address = %address, "Contract instantiated");
        Ok(address)
    }

    /// Execute `msg` on `contract` and return the transaction hash.
    pub async fn invoke(
        &self,
        contract: &str,
        msg: Value,
        funds: Option<Coins>,
        fee: Option<FeeBudget>,
    ) -> LedgerResult<String> {
        let fee = self.fee_or_default(fee, &self.fees.execute)?;
        let operation = Operation::Execute {
            contract: contract.to_string(),
            execute_msg: msg,
            coins: funds.unwrap_or_default(),
        };
        let submission = self.submit(operation, fee, None).await?;

        tracing::info!(contract = %contract, txhash = %submission.txhash, "Contract executed");
        Ok(submission.txhash)
    }

    /// Read-only contract query; no envelope is built.
    pub async fn query(&self, contract: &str, msg: &Value) -> LedgerResult<Value> {
        self.client.query_contract(contract, msg).await
    }

    /// Submit `operation`, retrying sequence conflicts within the policy budget.
    ///
    /// With a `target`, success additionally requires the event log to
    /// contain it; its absence is fatal and never retried.
    pub async fn submit(
        &self,
        operation: Operation,
        fee: FeeBudget,
        target: Option<&ExtractionTarget>,
    ) -> LedgerResult<Submission> {
        let kind = operation.kind();
        let span = tracing::info_span!(
            "submit",
            submission_id = %Uuid::new_v4(),
            operation = %kind,
            sender = %self.wallet.account(),
        );

        async move {
            let _serial = self.serial.lock().await;
            let result = self.run(operation, fee, target).await;
            metrics::record_submission(kind.as_str(), outcome_label(&result));
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        operation: Operation,
        fee: FeeBudget,
        target: Option<&ExtractionTarget>,
    ) -> LedgerResult<Submission> {
        let kind = operation.kind();
        let mut attempts = 0u32;
        let mut conflicted = false;

        loop {
            // Building
            let account = self.client.account(self.wallet.account()).await?;
            if conflicted {
                self.wallet.reset(&account);
            } else {
                self.wallet.observe(&account);
            }
            let envelope = self
                .builder
                .build(&self.wallet, operation.clone(), fee.clone())
                .await?;

            // Broadcasting
            attempts += 1;
            let start = Instant::now();
            let broadcast =
                with_deadline(self.attempt_timeout_secs, self.client.broadcast(&envelope)).await;
            metrics::record_broadcast(kind.as_str(), start);

            let result = match broadcast {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(attempt = attempts, error = %e, "Broadcast failed");
                    return Err(e);
                }
            };

            // Classifying
            match self.classifier.classify(&result) {
                Classification::SequenceConflict => {
                    metrics::record_sequence_conflict(kind.as_str());
                    if !self.policy.allows_another(attempts) {
                        tracing::error!(
                            attempts = attempts,
                            sequence = envelope.sequence(),
                            "Sequence conflict persisted, giving up"
                        );
                        return Err(LedgerError::RetryExhausted { attempts });
                    }

                    let delay = self.policy.delay_after(attempts);
                    tracing::warn!(
                        attempt = attempts,
                        sequence = envelope.sequence(),
                        delay_ms = delay.as_millis() as u64,
                        "Sequence conflict, rebuilding envelope"
                    );
                    conflicted = true;
                    sleep(delay).await;
                }
                Classification::Failed {
                    code,
                    codespace,
                    raw_log,
                } => {
                    if result.included_in_block() {
                        self.wallet.advance_past(envelope.sequence());
                    }
                    tracing::error!(
                        txhash = %result.txhash,
                        code = code,
                        codespace = %codespace,
                        raw_log = %raw_log,
                        "Transaction rejected"
                    );
                    return Err(LedgerError::Rejected {
                        operation: kind.as_str(),
                        code,
                        codespace,
                        raw_log,
                        txhash: result.txhash,
                    });
                }
                Classification::Succeeded => {
                    self.wallet.advance_past(envelope.sequence());

                    let value = match target {
                        None => None,
                        Some(target) => match result.event_log().extract(target) {
                            Some(value) => Some(value.to_string()),
                            None => {
                                tracing::error!(
                                    txhash = %result.txhash,
                                    event_type = %target.event_type,
                                    attribute_key = %target.attribute_key,
                                    "Expected event attribute missing"
                                );
                                return Err(LedgerError::MissingEvent {
                                    txhash: result.txhash,
                                    event_type: target.event_type.clone(),
                                    attribute_key: target.attribute_key.clone(),
                                });
                            }
                        },
                    };

                    tracing::info!(
                        txhash = %result.txhash,
                        height = result.height,
                        attempts = attempts,
                        gas_used = result.gas_used,
                        "Transaction succeeded"
                    );
                    return Ok(Submission {
                        txhash: result.txhash,
                        height: result.height,
                        gas_used: result.gas_used,
                        attempts,
                        value,
                    });
                }
            }
        }
    }

    fn fee_or_default(&self, fee: Option<FeeBudget>, default: &FeeSetting) -> LedgerResult<FeeBudget> {
        match fee {
            Some(fee) => Ok(fee),
            None => default.to_budget(),
        }
    }
}

impl std::fmt::Debug for Submitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Submitter")
            .field("account", &self.wallet.account())
            .field("chain_id", &self.wallet.chain_id())
            .field("policy", &self.policy)
            .finish()
    }
}

fn extracted(submission: &Submission, target: &ExtractionTarget) -> LedgerResult<String> {
    submission.value.clone().ok_or_else(|| LedgerError::MissingEvent {
        txhash: submission.txhash.clone(),
        event_type: target.event_type.clone(),
        attribute_key: target.attribute_key.clone(),
    })
}

fn outcome_label(result: &LedgerResult<Submission>) -> &'static str {
    match result {
        Ok(_) => "succeeded",
        Err(LedgerError::Rejected { .. }) => "rejected",
        Err(LedgerError::MissingEvent { .. }) => "missing_event",
        Err(LedgerError::RetryExhausted { .. }) => "retry_exhausted",
        Err(e) if e.is_transport() => "transport_error",
        Err(_) => "invalid",
    }
}
