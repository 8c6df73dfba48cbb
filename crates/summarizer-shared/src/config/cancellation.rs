//! # Cancellation Configuration (§4.8, §6)

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CancellationConfig {
    /// Wall-clock budget the graceful path gets before escalating to force.
    pub graceful_timeout_seconds: u64,
    /// Poll interval the graceful drain loop uses to check for quiescence.
    pub checkpoint_poll_ms: u64,
}

impl Default for CancellationConfig {
    fn default() -> Self {
        Self {
            graceful_timeout_seconds: 30,
            checkpoint_poll_ms: 100,
        }
    }
}

impl CancellationConfig {
    #[must_use]
    pub fn graceful_timeout(&self) -> Duration {
        Duration::from_secs(self.graceful_timeout_seconds)
    }

    #[must_use]
    pub fn checkpoint_poll_interval(&self) -> Duration {
        Duration::from_millis(self.checkpoint_poll_ms)
    }
}
