//! Exponential backoff settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backoff between failed polls.
///
/// The first retry waits `initial_delay_ms`; each further consecutive
/// failure multiplies the wait by `backoff_multiplier`, capped at
/// `max_delay_ms`. A success resets the wait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Returns the wait that follows `current`. Saturates at `max_delay`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        let max = self.max_delay();
        let scaled = current.as_secs_f64() * self.backoff_multiplier.max(1.0);
        Duration::try_from_secs_f64(scaled).map_or(max, |delay| delay.min(max))
    }
}
