//! Ledger-specific types and error definitions.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// Re-export LedgerConfig from config module to avoid duplication
pub use crate::config::schema::LedgerConfig;

/// Errors that can occur while submitting transactions to the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Gateway connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Gateway request or broadcast attempt timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The ledger processed the transaction and reported a non-zero code.
    #[error("{operation} failed. code: {code}, codespace: {codespace}, raw_log: {raw_log}")]
    Rejected {
        operation: &'static str,
        code: u32,
        codespace: String,
        raw_log: String,
        txhash: String,
    },

    /// A successful transaction did not emit the expected event attribute.
    #[error("transaction {txhash} has no `{attribute_key}` attribute in any `{event_type}` event")]
    MissingEvent {
        txhash: String,
        event_type: String,
        attribute_key: String,
    },

    /// The expected attribute was present but could not be interpreted.
    #[error("transaction {txhash} emitted malformed `{attribute_key}` value {value:?}")]
    MalformedValue {
        txhash: String,
        attribute_key: String,
        value: String,
    },

    /// Sequence conflicts persisted for the whole attempt budget.
    #[error("sequence conflict persisted after {attempts} attempts")]
    RetryExhausted { attempts: u32 },

    /// Operation payload failed validation before signing.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Fee budget failed validation before signing.
    #[error("Invalid fee: {0}")]
    InvalidFee(String),

    /// Invalid private key format or signing failure.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Gateway reports a different chain than configured.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: String, actual: String },

    /// Local file access failed (e.g. reading bytecode).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    /// True when the gateway call itself could not complete.
    pub fn is_transport(&self) -> bool {
        matches!(self, LedgerError::Rpc(_) | LedgerError::Timeout(_))
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// A single denominated amount, e.g. `1000000uusd`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "amount_string")]
    pub amount: u128,
}

impl Coin {
    pub fn new(amount: u128, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| LedgerError::InvalidFee(format!("coin {:?} has no denom", s)))?;
        let (amount, denom) = s.split_at(split);

        if amount.is_empty() {
            return Err(LedgerError::InvalidFee(format!("coin {:?} has no amount", s)));
        }
        if !is_valid_denom(denom) {
            return Err(LedgerError::InvalidFee(format!("coin {:?} has invalid denom", s)));
        }

        let amount = amount
            .parse::<u128>()
            .map_err(|e| LedgerError::InvalidFee(format!("coin {:?}: {}", s, e)))?;

        Ok(Coin::new(amount, denom))
    }
}

// [a-zA-Z][a-zA-Z0-9/:._-]{2,127}
fn is_valid_denom(denom: &str) -> bool {
    let mut chars = denom.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    first_ok
        && (3..=128).contains(&denom.len())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'))
}

/// An ordered list of coins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coins(pub Vec<Coin>);

impl Coins {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        Self(vec![coin])
    }
}

impl FromStr for Coins {
    type Err = LedgerError;

    /// Parse the compact `"10uluna,5uusd"` form. An empty string yields no coins.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Coins::empty());
        }
        s.split(',').map(Coin::from_str).collect::<Result<Vec<_>, _>>().map(Coins)
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, coin) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", coin)?;
        }
        Ok(())
    }
}

/// Gas limit paired with the fee paid for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBudget {
    #[serde(rename = "gas", with = "amount_string")]
    pub gas_limit: u64,
    pub amount: Coins,
}

impl FeeBudget {
    /// Build a fee budget from a gas limit and a compact coin string.
    pub fn new(gas_limit: u64, amount: &str) -> LedgerResult<Self> {
        let fee = Self {
            gas_limit,
            amount: amount.parse()?,
        };
        fee.validate()?;
        Ok(fee)
    }

    /// Gas must be positive and at least one positive fee coin must be present.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.gas_limit == 0 {
            return Err(LedgerError::InvalidFee("gas limit must be positive".to_string()));
        }
        if self.amount.is_empty() {
            return Err(LedgerError::InvalidFee("fee amount is empty".to_string()));
        }
        if let Some(coin) = self.amount.iter().find(|c| c.amount == 0) {
            return Err(LedgerError::InvalidFee(format!("fee coin {} is zero", coin)));
        }
        Ok(())
    }
}

/// Account state needed to sign: account number and next sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AccountInfo {
    #[serde(deserialize_with = "u64_from_str_or_num")]
    pub account_number: u64,
    #[serde(deserialize_with = "u64_from_str_or_num")]
    pub sequence: u64,
}

/// Gateways encode 64-bit integers either as JSON strings or numbers.
pub(crate) fn u64_from_str_or_num<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) if s.is_empty() => Ok(0),
        Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

mod amount_string {
    use super::*;

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: fmt::Display,
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: fmt::Display,
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_parsing() {
        let coin: Coin = "20000000uusd".parse().unwrap();
        assert_eq!(coin, Coin::new(20_000_000, "uusd"));
        assert_eq!(coin.to_string(), "20000000uusd");

        assert!("uusd".parse::<Coin>().is_err());
        assert!("100".parse::<Coin>().is_err());
        assert!("100u".parse::<Coin>().is_err());
        assert!("100 uusd".parse::<Coin>().is_err());
    }

    #[test]
    fn test_coins_parsing() {
        let coins: Coins = "10uluna, 5uusd".parse().unwrap();
        assert_eq!(coins.0.len(), 2);
        assert_eq!(coins.to_string(), "10uluna,5uusd");

        let empty: Coins = "".parse().unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_fee_budget_validation() {
        let fee = FeeBudget::new(10_000_000, "20000000uusd").unwrap();
        assert_eq!(fee.gas_limit, 10_000_000);

        assert!(matches!(FeeBudget::new(0, "1uusd"), Err(LedgerError::InvalidFee(_))));
        assert!(matches!(FeeBudget::new(100, ""), Err(LedgerError::InvalidFee(_))));
        assert!(matches!(FeeBudget::new(100, "0uusd"), Err(LedgerError::InvalidFee(_))));
    }

    #[test]
    fn test_fee_serializes_amounts_as_strings() {
        let fee = FeeBudget::new(5_000_000, "1000000uusd").unwrap();
        let json = serde_json::to_value(&fee).unwrap();
        assert_eq!(json["gas"], "5000000");
        assert_eq!(json["amount"][0]["amount"], "1000000");
        assert_eq!(json["amount"][0]["denom"], "uusd");
    }

    #[test]
    fn test_account_info_accepts_strings_and_numbers() {
        let info: AccountInfo =
            serde_json::from_str(r#"{"account_number":"12","sequence":7}"#).unwrap();
        assert_eq!(info.account_number, 12);
        assert_eq!(info.sequence, 7);
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");
        assert!(err.is_transport());

        let err = LedgerError::Rejected {
            operation: "store code",
            code: 5,
            codespace: "sdk".to_string(),
            raw_log: "insufficient funds".to_string(),
            txhash: "ABC".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "store code failed. code: 5, codespace: sdk, raw_log: insufficient funds"
        );
        assert!(!err.is_transport());
    }
}
