//! # Partial Result Retention Configuration (§4.7, §6)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PartialResultConfig {
    /// How long a saved partial result stays retrievable before
    /// `cleanup_expired` is allowed to reclaim it. Accepted range 1..168h.
    pub expiry_hours: u32,
}

impl Default for PartialResultConfig {
    fn default() -> Self {
        Self { expiry_hours: 24 }
    }
}

impl PartialResultConfig {
    pub const MIN_EXPIRY_HOURS: u32 = 1;
    pub const MAX_EXPIRY_HOURS: u32 = 168;

    #[must_use]
    pub fn clamped_expiry_hours(&self) -> u32 {
        self.expiry_hours
            .clamp(Self::MIN_EXPIRY_HOURS, Self::MAX_EXPIRY_HOURS)
    }

    #[must_use]
    pub fn expiry(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.clamped_expiry_hours()))
    }
}
