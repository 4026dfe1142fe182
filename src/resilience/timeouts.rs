//! Deadline enforcement for ledger calls.

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::ledger::types::{LedgerError, LedgerResult};

/// Run `fut` under a deadline of `secs` seconds; 0 disables the deadline.
pub async fn with_deadline<F, T>(secs: u64, fut: F) -> LedgerResult<T>
where
    F: Future<Output = LedgerResult<T>>,
{
    if secs == 0 {
        return fut.await;
    }

    match timeout(Duration::from_secs(secs), fut).await {
        Ok(result) => result,
        Err(_) => Err(LedgerError::Timeout(secs)),
    }
}
