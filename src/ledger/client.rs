//! Ledger gateway client with timeout and failover handling.
//!
//! # Responsibilities
//! - Broadcast signed envelopes and decode the broadcast result
//! - Query account state (account number, sequence) for signing
//! - Query chain identity and contract state
//! - Bound every request by the configured timeout
//!
//! # Failover
//! Reads walk the endpoint list until one answers. A broadcast only moves on
//! to the next endpoint when the connection could not be established, since
//! any later failure may mean the envelope already reached the ledger.

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use crate::ledger::events::BroadcastResult;
use crate::ledger::transaction::Envelope;
use crate::ledger::types::{AccountInfo, LedgerConfig, LedgerError, LedgerResult};
use crate::observability::metrics;

/// The network boundary of the submitter.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Broadcast a signed envelope and wait for the ledger's verdict.
    async fn broadcast(&self, envelope: &Envelope) -> LedgerResult<BroadcastResult>;

    /// Current account number and sequence of `address`.
    async fn account(&self, address: &str) -> LedgerResult<AccountInfo>;

    /// Chain ID the gateway is serving.
    async fn chain_id(&self) -> LedgerResult<String>;

    /// Read-only smart query against a contract.
    async fn query_contract(&self, contract: &str, msg: &Value) -> LedgerResult<Value>;
}

#[derive(Deserialize)]
struct AccountResponse {
    account: AccountInfo,
}

#[derive(Deserialize)]
struct NodeInfoResponse {
    node_info: NodeInfo,
}

#[derive(Deserialize)]
struct NodeInfo {
    network: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    result: Value,
}

enum CallError {
    /// Connection never established; the request did not reach the gateway.
    Unreachable(String),
    Failed(String),
    TimedOut,
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallError::Unreachable(e) => write!(f, "unreachable: {}", e),
            CallError::Failed(e) => f.write_str(e),
            CallError::TimedOut => f.write_str("timed out"),
        }
    }
}

/// JSON REST gateway client with failover support.
#[derive(Clone)]
pub struct HttpLedgerClient {
    http: reqwest::Client,
    /// Primary endpoint followed by failovers.
    endpoints: Vec<Url>,
    config: LedgerConfig,
    timeout_duration: Duration,
}

impl HttpLedgerClient {
    /// Create a new gateway client.
    ///
    /// Fails only when the primary URL is invalid; invalid failover URLs are
    /// skipped with a warning.
    pub fn new(config: LedgerConfig) -> LedgerResult<Self> {
        let timeout_duration = Duration::from_secs(config.request_timeout_secs);

        let primary = parse_endpoint(&config.lcd_url).map_err(|e| {
            LedgerError::Rpc(format!("Invalid gateway URL '{}': {}", config.lcd_url, e))
        })?;
        let mut endpoints = vec![primary];

        for url_str in &config.failover_urls {
            match parse_endpoint(url_str) {
                Ok(url) => endpoints.push(url),
                Err(e) => {
                    tracing::warn!(url = %url_str, error = %e, "Ignoring invalid failover gateway URL")
                }
            }
        }

        let http = reqwest::Client::builder()
            .timeout(timeout_duration)
            .build()
            .map_err(|e| LedgerError::Rpc(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(
            lcd_url = %config.lcd_url,
            chain_id = %config.chain_id,
            endpoints = endpoints.len(),
            "Ledger client initialized"
        );

        Ok(Self {
            http,
            endpoints,
            config,
            timeout_duration,
        })
    }

    /// Verify the gateway serves the configured chain.
    pub async fn verify_chain_id(&self) -> LedgerResult<()> {
        let actual = self.chain_id().await?;
        if actual != self.config.chain_id {
            return Err(LedgerError::ChainMismatch {
                expected: self.config.chain_id.clone(),
                actual,
            });
        }
        Ok(())
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, CallError> {
        let fut = async {
            let response = request.send().await.map_err(|e| {
                if e.is_connect() {
                    CallError::Unreachable(e.to_string())
                } else {
                    CallError::Failed(e.to_string())
                }
            })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(CallError::Failed(format!("HTTP {}: {}", status, body)));
            }

            response
                .json::<T>()
                .await
                .map_err(|e| CallError::Failed(format!("invalid response body: {}", e)))
        };

        match timeout(self.timeout_duration, fut).await {
            Ok(result) => result,
            Err(_) => Err(CallError::TimedOut),
        }
    }

    /// GET `path` from each endpoint in turn until one answers.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> LedgerResult<T> {
        for (i, base) in self.endpoints.iter().enumerate() {
            let url = endpoint_url(base, path)?;
            match self.call(self.http.get(url).query(query)).await {
                Ok(value) => {
                    metrics::record_gateway_request(what, true);
                    return Ok(value);
                }
                Err(e) => {
                    metrics::record_gateway_request(what, false);
                    tracing::warn!(endpoint_idx = i, error = %e, "Gateway error, trying next endpoint");
                }
            }
        }
        Err(LedgerError::Rpc(format!("All gateway endpoints failed to {}", what)))
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn broadcast(&self, envelope: &Envelope) -> LedgerResult<BroadcastResult> {
        let body = json!({
            "tx": envelope.to_wire(),
            "mode": self.config.broadcast_mode,
        });

        for (i, base) in self.endpoints.iter().enumerate() {
            let url = endpoint_url(base, "txs")?;
            match self.call::<BroadcastResult>(self.http.post(url).json(&body)).await {
                Ok(result) => {
                    metrics::record_gateway_request("broadcast", true);
                    return Ok(result);
                }
                Err(CallError::Unreachable(e)) => {
                    metrics::record_gateway_request("broadcast", false);
                    tracing::warn!(endpoint_idx = i, error = %e, "Gateway unreachable, trying next endpoint");
                }
                Err(CallError::TimedOut) => {
                    metrics::record_gateway_request("broadcast", false);
                    return Err(LedgerError::Timeout(self.config.request_timeout_secs));
                }
                Err(CallError::Failed(e)) => {
                    metrics::record_gateway_request("broadcast", false);
                    return Err(LedgerError::Rpc(format!("Broadcast failed: {}", e)));
                }
            }
        }
        Err(LedgerError::Rpc("All gateway endpoints unreachable for broadcast".to_string()))
    }

    async fn account(&self, address: &str) -> LedgerResult<AccountInfo> {
        let path = format!("cosmos/auth/v1beta1/accounts/{}", address);
        let response: AccountResponse = self.get(&path, &[], "get account").await?;
        Ok(response.account)
    }

    async fn chain_id(&self) -> LedgerResult<String> {
        let response: NodeInfoResponse = self.get("node_info", &[], "get node info").await?;
        Ok(response.node_info.network)
    }

    async fn query_contract(&self, contract: &str, msg: &Value) -> LedgerResult<Value> {
        let path = format!("wasm/contracts/{}/store", contract);
        let query = [("query_msg", msg.to_string())];
        let response: QueryResponse = self.get(&path, &query, "query contract").await?;
        Ok(response.result)
    }
}

impl std::fmt::Debug for HttpLedgerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpLedgerClient")
            .field("lcd_url", &self.config.lcd_url)
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.request_timeout_secs)
            .finish()
    }
}

/// Parse a base URL so that relative joins append to its path.
fn parse_endpoint(raw: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn endpoint_url(base: &Url, path: &str) -> LedgerResult<Url> {
    base.join(path)
        .map_err(|e| LedgerError::Rpc(format!("Invalid gateway path '{}': {}", path, e)))
}
