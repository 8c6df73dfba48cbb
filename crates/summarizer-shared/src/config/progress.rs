//! # Progress Calculator Configuration (§4.5, §6)

use crate::domain::Stage;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Weight (out of 100) and estimated-duration multiplier assigned to each
/// [`Stage`]. The Progress Calculator (§4.5) uses `weight` to turn
/// per-stage completion fractions into an overall percentage, and
/// `time_multiplier` to scale the observed-so-far rate into an estimate
/// for the remaining stages.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct StageWeight {
    pub stage: Stage,
    pub weight: f64,
    pub time_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub stage_weights: Vec<StageWeight>,
    /// Minimum gap between two `progress_update` notifications for the same
    /// batch, to avoid flooding subscribers (§4.6).
    pub duplicate_suppression_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            stage_weights: vec![
                StageWeight {
                    stage: Stage::Initializing,
                    weight: 5.0,
                    time_multiplier: 0.1,
                },
                StageWeight {
                    stage: Stage::Segmenting,
                    weight: 10.0,
                    time_multiplier: 0.2,
                },
                StageWeight {
                    stage: Stage::BatchProcessing,
                    weight: 70.0,
                    time_multiplier: 1.0,
                },
                StageWeight {
                    stage: Stage::Merging,
                    weight: 10.0,
                    time_multiplier: 0.3,
                },
                StageWeight {
                    stage: Stage::Finalizing,
                    weight: 5.0,
                    time_multiplier: 0.1,
                },
            ],
            duplicate_suppression_ms: 500,
        }
    }
}

impl ProgressConfig {
    #[must_use]
    pub fn weight_for(&self, stage: Stage) -> f64 {
        self.stage_weights
            .iter()
            .find(|w| w.stage == stage)
            .map_or(0.0, |w| w.weight)
    }

    #[must_use]
    pub fn time_multiplier_for(&self, stage: Stage) -> f64 {
        self.stage_weights
            .iter()
            .find(|w| w.stage == stage)
            .map_or(1.0, |w| w.time_multiplier)
    }

    #[must_use]
    pub fn duplicate_suppression_window(&self) -> Duration {
        Duration::from_millis(self.duplicate_suppression_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one_hundred() {
        let config = ProgressConfig::default();
        let total: f64 = config.stage_weights.iter().map(|w| w.weight).sum();
        assert!((total - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn covers_every_stage_exactly_once() {
        let config = ProgressConfig::default();
        for stage in Stage::ALL {
            let matches = config.stage_weights.iter().filter(|w| w.stage == stage).count();
            assert_eq!(matches, 1);
        }
    }
}
