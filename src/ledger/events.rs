//! Broadcast results and the structured event log they carry.
//!
//! # Event Log Layout
//! ```text
//! BroadcastResult.logs: [ { msg_index, events: [ { type, attributes: [ {key, value} ] } ] } ]
//!     → flattened in message order into one EventLog
//! ```
//!
//! Keys are not unique within an event or across events. Lookups scan in log
//! order and the first match wins.

use serde::{Deserialize, Serialize};

use crate::ledger::types::u64_from_str_or_num;

/// One key/value pair of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// A named event emitted while applying a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl Event {
    pub fn new<K, V>(kind: impl Into<String>, attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            kind: kind.into(),
            attributes: attributes
                .into_iter()
                .map(|(key, value)| Attribute {
                    key: key.into(),
                    value: value.into(),
                })
                .collect(),
        }
    }

    /// First value recorded under `key`.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.key == key)
            .map(|attr| attr.value.as_str())
    }
}

/// Events produced by one message of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLog {
    #[serde(default)]
    pub msg_index: u32,
    #[serde(default)]
    pub log: String,
    #[serde(default)]
    pub events: Vec<Event>,
}

/// Event type and attribute key locating a value in the event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionTarget {
    pub event_type: String,
    pub attribute_key: String,
}

impl ExtractionTarget {
    pub fn new(event_type: impl Into<String>, attribute_key: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            attribute_key: attribute_key.into(),
        }
    }

    /// Code id assigned to uploaded bytecode.
    pub fn code_id() -> Self {
        Self::new("store_code", "code_id")
    }

    /// Address of a freshly instantiated contract.
    pub fn contract_address() -> Self {
        Self::new("instantiate_contract", "contract_address")
    }
}

/// Ordered events of a processed transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog(Vec<Event>);

impl EventLog {
    pub fn new(events: Vec<Event>) -> Self {
        Self(events)
    }

    /// Flatten per-message logs in message order.
    pub fn from_message_logs(logs: &[MessageLog]) -> Self {
        Self(logs.iter().flat_map(|log| log.events.iter().cloned()).collect())
    }

    /// Parse a raw log that carries the per-message logs as a JSON array.
    ///
    /// Returns `None` for plain-text raw logs.
    pub fn parse_raw_log(raw_log: &str) -> Option<Self> {
        serde_json::from_str::<Vec<MessageLog>>(raw_log)
            .ok()
            .map(|logs| Self::from_message_logs(&logs))
    }

    pub fn events(&self) -> &[Event] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of `target.attribute_key` in the first event of type
    /// `target.event_type`.
    ///
    /// Only that first event is consulted: if it lacks the key the result is
    /// `None`, even when a later event of the same type carries it.
    pub fn extract(&self, target: &ExtractionTarget) -> Option<&str> {
        self.0
            .iter()
            .find(|event| event.kind == target.event_type)
            .and_then(|event| event.attribute(&target.attribute_key))
    }
}

impl From<Vec<Event>> for EventLog {
    fn from(events: Vec<Event>) -> Self {
        Self(events)
    }
}

/// Outcome of one broadcast as reported by the ledger gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResult {
    /// Block height; 0 when the transaction never reached a block.
    #[serde(default, deserialize_with = "u64_from_str_or_num")]
    pub height: u64,
    #[serde(default)]
    pub txhash: String,
    /// 0 on success.
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub codespace: String,
    #[serde(default)]
    pub raw_log: String,
    #[serde(default)]
    pub logs: Option<Vec<MessageLog>>,
    #[serde(default, deserialize_with = "u64_from_str_or_num")]
    pub gas_wanted: u64,
    #[serde(default, deserialize_with = "u64_from_str_or_num")]
    pub gas_used: u64,
}

impl BroadcastResult {
    /// The ledger's error indicator.
    pub fn is_tx_error(&self) -> bool {
        self.code != 0
    }

    /// True when the transaction was applied in a block, successful or not.
    pub fn included_in_block(&self) -> bool {
        self.height > 0
    }

    /// Structured event log, falling back to a JSON raw log.
    pub fn event_log(&self) -> EventLog {
        match &self.logs {
            Some(logs) if !logs.is_empty() => EventLog::from_message_logs(logs),
            _ => EventLog::parse_raw_log(&self.raw_log).unwrap_or_default(),
        }
    }
}
