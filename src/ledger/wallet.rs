//! Signing identity and account sequence tracking.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized
//!
//! # Sequence Tracking
//! The ledger owns the authoritative sequence. The wallet keeps a local copy
//! that is raised to the chain's value before every build and advanced past
//! every sequence the ledger consumed, so back-to-back submissions do not
//! wait for the gateway's account view to catch up.

use alloy::primitives::B256;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::{Signature, Signer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::ledger::types::{AccountInfo, LedgerError, LedgerResult};

/// Default environment variable holding the signing key.
pub const PRIVATE_KEY_ENV_VAR: &str = "LEDGER_SIGNER_PRIVATE_KEY";

/// Signing identity with account-state tracking.
#[derive(Debug)]
pub struct Wallet {
    /// The underlying signer (private key).
    signer: PrivateKeySigner,
    /// Compressed SEC1 public key (33 bytes).
    public_key: Vec<u8>,
    /// Account address the ledger knows this identity by.
    account: String,
    /// Chain ID bound into every sign document.
    chain_id: String,
    /// Next sequence to sign with.
    sequence: Arc<AtomicU64>,
    /// Ledger-assigned account number.
    account_number: Arc<AtomicU64>,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    /// * `chain_id` - Chain the wallet signs for
    ///
    /// The account address defaults to the key's hex address; use
    /// [`Wallet::with_account`] when the ledger uses another address format.
    pub fn from_private_key(private_key_hex: &str, chain_id: impl Into<String>) -> LedgerResult<Self> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| LedgerError::Wallet(format!("Invalid private key format: {}", e)))?;

        let chain_id = chain_id.into();
        let account = signer.address().to_string();
        let public_key = signer
            .credential()
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec();

        tracing::info!(
            account = %account,
            chain_id = %chain_id,
            "Wallet initialized"
        );

        Ok(Self {
            signer,
            public_key,
            account,
            chain_id,
            sequence: Arc::new(AtomicU64::new(0)),
            account_number: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Load wallet from the named environment variable.
    pub fn from_env(var: &str, chain_id: impl Into<String>) -> LedgerResult<Self> {
        let private_key = std::env::var(var).map_err(|_| {
            LedgerError::Wallet(format!("Environment variable {} not set", var))
        })?;

        Self::from_private_key(&private_key, chain_id)
    }

    /// Override the account address used as the envelope sender.
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = account.into();
        self
    }

    /// Account address of this identity.
    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// Compressed public key the ledger verifies signatures against.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn account_number(&self) -> u64 {
        self.account_number.load(Ordering::SeqCst)
    }

    /// Sequence the next envelope will carry.
    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Merge the ledger's account view. The local sequence never moves backwards here.
    pub fn observe(&self, info: &AccountInfo) {
        self.account_number.store(info.account_number, Ordering::SeqCst);
        self.sequence.fetch_max(info.sequence, Ordering::SeqCst);
    }

    /// Adopt the ledger's account view verbatim, discarding local progress.
    ///
    /// Used after a sequence conflict, when the local value is provably wrong.
    pub fn reset(&self, info: &AccountInfo) {
        self.account_number.store(info.account_number, Ordering::SeqCst);
        self.sequence.store(info.sequence, Ordering::SeqCst);
    }

    /// Record that the ledger consumed `used`.
    pub fn advance_past(&self, used: u64) {
        self.sequence.fetch_max(used.saturating_add(1), Ordering::SeqCst);
    }

    /// Sign a 32-byte digest.
    pub async fn sign_hash(&self, hash: B256) -> LedgerResult<Signature> {
        self.signer
            .sign_hash(&hash)
            .await
            .map_err(|e| LedgerError::Wallet(format!("Signing failed: {}", e)))
    }
}

impl Clone for Wallet {
    fn clone(&self) -> Self {
        Self {
            signer: self.signer.clone(),
            public_key: self.public_key.clone(),
            account: self.account.clone(),
            chain_id: self.chain_id.clone(),
            sequence: self.sequence.clone(),
            account_number: self.account_number.clone(),
        }
    }
}
