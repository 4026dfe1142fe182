//! Retry policy for sequence conflicts.
//!
//! # Responsibilities
//! - Bound the number of broadcasts per submission
//! - Space rebuilds out with exponential backoff + jitter

use rand::Rng;
use std::time::Duration;

use crate::config::schema::RetryConfig;

/// Attempt budget and backoff schedule for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl RetryPolicy {
    /// A budget of zero attempts is raised to one.
    pub fn new(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
            max_delay_ms,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.base_delay_ms, config.max_delay_ms)
    }

    /// Total broadcasts allowed, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether another broadcast may follow `attempts_made`.
    pub fn allows_another(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }

    /// Delay before the attempt following `attempts_made`.
    ///
    /// `base * 2^(attempts_made - 1)` capped at the maximum, plus up to 10%
    /// random jitter. No delay before the first attempt.
    pub fn delay_after(&self, attempts_made: u32) -> Duration {
        if attempts_made == 0 {
            return Duration::ZERO;
        }

        let factor = 1u64.checked_shl(attempts_made - 1).unwrap_or(u64::MAX);
        let capped = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);

        let jitter = match capped / 10 {
            0 => 0,
            spread => rand::thread_rng().gen_range(0..spread),
        };
        Duration::from_millis(capped + jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
