//! # Concurrency Controller Configuration (§4.3, §6)

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    pub default_concurrent_limit: usize,
    pub max_concurrent_limit: usize,
    #[serde(with = "humantime_seconds")]
    pub adjustment_interval: Duration,
    /// Minimum samples in the rolling window before the adjustment loop acts.
    pub min_samples_for_adjustment: usize,
    /// Sample cap per rolling window (latency, outcome).
    pub sample_window_cap: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            default_concurrent_limit: 2,
            max_concurrent_limit: 8,
            adjustment_interval: Duration::from_secs(10),
            min_samples_for_adjustment: 10,
            sample_window_cap: 100,
        }
    }
}

mod humantime_seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}
