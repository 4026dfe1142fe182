//! Operation payloads and signed envelope construction.
//!
//! # Responsibilities
//! - Validate operation payloads and fee budgets before signing
//! - Render the ledger's message JSON for each operation kind
//! - Sign the canonical sign document with the wallet's current sequence
//!
//! The builder never touches the network. The account state it signs with is
//! whatever the wallet holds at build time; refreshing it is the submitter's job.

use alloy::primitives::keccak256;
use alloy::signers::Signature;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use std::fmt;

use crate::ledger::types::{Coins, FeeBudget, LedgerError, LedgerResult};
use crate::ledger::wallet::Wallet;

/// The three operation kinds the ledger accepts from this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    StoreCode,
    Instantiate,
    Execute,
}

impl OperationKind {
    /// Label used in logs, metrics and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::StoreCode => "store code",
            OperationKind::Instantiate => "instantiate",
            OperationKind::Execute => "execute",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state-changing request carried by an envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Upload contract bytecode.
    StoreCode { wasm_byte_code: Vec<u8> },
    /// Create a contract from uploaded code. `migratable` makes the sender its admin.
    Instantiate {
        code_id: u64,
        init_msg: Value,
        migratable: bool,
        init_coins: Coins,
    },
    /// Call a deployed contract, optionally attaching funds.
    Execute {
        contract: String,
        execute_msg: Value,
        coins: Coins,
    },
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::StoreCode { .. } => OperationKind::StoreCode,
            Operation::Instantiate { .. } => OperationKind::Instantiate,
            Operation::Execute { .. } => OperationKind::Execute,
        }
    }

    /// Reject payloads the ledger would refuse or misinterpret.
    pub fn validate(&self) -> LedgerResult<()> {
        match self {
            Operation::StoreCode { wasm_byte_code } => {
                if wasm_byte_code.is_empty() {
                    return Err(LedgerError::InvalidOperation("bytecode is empty".to_string()));
                }
            }
            Operation::Instantiate { code_id, init_msg, .. } => {
                if *code_id == 0 {
                    return Err(LedgerError::InvalidOperation("code id must be positive".to_string()));
                }
                require_object("init_msg", init_msg)?;
            }
            Operation::Execute {
                contract,
                execute_msg,
                ..
            } => {
                if contract.trim().is_empty() {
                    return Err(LedgerError::InvalidOperation(
                        "contract address is empty".to_string(),
                    ));
                }
                require_object("execute_msg", execute_msg)?;
            }
        }
        Ok(())
    }

    /// Ledger message JSON for this operation sent by `sender`.
    pub fn to_msg(&self, sender: &str) -> Value {
        match self {
            Operation::StoreCode { wasm_byte_code } => json!({
                "type": "wasm/MsgStoreCode",
                "value": {
                    "sender": sender,
                    "wasm_byte_code": BASE64.encode(wasm_byte_code),
                }
            }),
            Operation::Instantiate {
                code_id,
                init_msg,
                migratable,
                init_coins,
            } => {
                let admin = if *migratable { sender } else { "" };
                json!({
                    "type": "wasm/MsgInstantiateContract",
                    "value": {
                        "sender": sender,
                        "admin": admin,
                        "code_id": code_id.to_string(),
                        "init_msg": init_msg,
                        "init_coins": init_coins,
                    }
                })
            }
            Operation::Execute {
                contract,
                execute_msg,
                coins,
            } => json!({
                "type": "wasm/MsgExecuteContract",
                "value": {
                    "sender": sender,
                    "contract": contract,
                    "execute_msg": execute_msg,
                    "coins": coins,
                }
            }),
        }
    }
}

fn require_object(field: &str, value: &Value) -> LedgerResult<()> {
    match value {
        Value::Object(_) => Ok(()),
        other => Err(LedgerError::InvalidOperation(format!(
            "{} must be a JSON object, got {}",
            field,
            json_type(other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A signed, ready-to-broadcast transaction.
#[derive(Debug, Clone)]
pub struct Envelope {
    sender: String,
    chain_id: String,
    account_number: u64,
    sequence: u64,
    operation: Operation,
    fee: FeeBudget,
    memo: String,
    public_key: Vec<u8>,
    signature: Signature,
}

impl Envelope {
    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn account_number(&self) -> u64 {
        self.account_number
    }

    /// Sequence number the envelope was signed with.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn fee(&self) -> &FeeBudget {
        &self.fee
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    /// Compressed public key of the signer.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Bytes the signature covers.
    pub fn sign_bytes(&self) -> Vec<u8> {
        sign_doc(
            &self.chain_id,
            self.account_number,
            self.sequence,
            &self.fee,
            &self.memo,
            &self.operation.to_msg(&self.sender),
        )
    }

    /// Wire form accepted by the gateway's broadcast route.
    pub fn to_wire(&self) -> Value {
        json!({
            "msg": [self.operation.to_msg(&self.sender)],
            "fee": self.fee,
            "memo": self.memo,
            "signatures": [{
                "pub_key": {
                    "type": "tendermint/PubKeySecp256k1",
                    "value": BASE64.encode(&self.public_key),
                },
                "signature": BASE64.encode(self.signature.as_bytes()),
                "account_number": self.account_number.to_string(),
                "sequence": self.sequence.to_string(),
            }],
        })
    }
}

// serde_json::Value objects are key-sorted, which makes this canonical.
fn sign_doc(
    chain_id: &str,
    account_number: u64,
    sequence: u64,
    fee: &FeeBudget,
    memo: &str,
    msg: &Value,
) -> Vec<u8> {
    let doc = json!({
        "account_number": account_number.to_string(),
        "chain_id": chain_id,
        "fee": fee,
        "memo": memo,
        "msgs": [msg],
        "sequence": sequence.to_string(),
    });
    doc.to_string().into_bytes()
}

/// Builds signed envelopes from operations.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeBuilder {
    memo: String,
}

impl EnvelopeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a memo to every envelope this builder produces.
    pub fn with_memo(memo: impl Into<String>) -> Self {
        Self { memo: memo.into() }
    }

    /// Validate, then sign `operation` with the wallet's current account state.
    ///
    /// # Arguments
    /// * `wallet` - Signing identity; its sequence is read, not advanced
    /// * `operation` - Payload to carry
    /// * `fee` - Gas limit and fee amount
    pub async fn build(
        &self,
        wallet: &Wallet,
        operation: Operation,
        fee: FeeBudget,
    ) -> LedgerResult<Envelope> {
        fee.validate()?;
        operation.validate()?;

        let sender = wallet.account().to_string();
        let chain_id = wallet.chain_id().to_string();
        let account_number = wallet.account_number();
        let sequence = wallet.current_sequence();

        let bytes = sign_doc(
            &chain_id,
            account_number,
            sequence,
            &fee,
            &self.memo,
            &operation.to_msg(&sender),
        );
        let signature = wallet.sign_hash(keccak256(&bytes)).await?;

        tracing::debug!(
            sender = %sender,
            operation = %operation.kind(),
            sequence = sequence,
            gas_limit = fee.gas_limit,
            "Envelope built"
        );

        Ok(Envelope {
            sender,
            chain_id,
            account_number,
            sequence,
            operation,
            fee,
            memo: self.memo.clone(),
            public_key: wallet.public_key().to_vec(),
            signature,
        })
    }
}
