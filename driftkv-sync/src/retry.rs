//! Delivery retry policy.
//!
//! An explicit value object instead of ad hoc timers, so the schedule can
//! be asserted in tests without waiting on wall clocks. The default is the
//! classic best-effort discipline: one retry, five seconds later, then give
//! up and leave reconciliation to a later sync round.

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_max_attempts() -> u32 {
    2
}

fn default_delay_ms() -> u64 {
    5_000
}

fn default_backoff() -> f64 {
    1.0
}

/// How many times to attempt a send, and how long to wait between tries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first send.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Multiplier applied to the delay after each retry (1.0 = fixed).
    #[serde(default = "default_backoff")]
    pub backoff: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
            backoff: default_backoff(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            delay_ms: 0,
            backoff: 1.0,
        }
    }

    /// Whether another attempt should follow `attempts_made` failed ones.
    #[must_use]
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }

    /// The delay to wait after the given (1-based) failed attempt.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.backoff.powi(attempt.saturating_sub(1) as i32);
        Duration::from_millis((self.delay_ms as f64 * factor) as u64)
    }
}
