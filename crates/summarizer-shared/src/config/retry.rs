//! # Retry / Backoff Configuration
//!
//! Per-task retry policy consumed by the Segment Task Worker (§4.4).

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_seconds: f64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_seconds: 1.0,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// `base_delay * multiplier^attempt` (§4.4), `attempt` 0-indexed.
    #[must_use]
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let seconds = self.base_delay_seconds * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_secs_f64(seconds.max(0.0))
    }
}
