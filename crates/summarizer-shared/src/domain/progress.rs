//! Progress snapshot types (§3, §4.5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named phase of a batch's lifecycle, used for progress weighting (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Initializing,
    Segmenting,
    BatchProcessing,
    Merging,
    Finalizing,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Initializing,
        Stage::Segmenting,
        Stage::BatchProcessing,
        Stage::Merging,
        Stage::Finalizing,
    ];
}

/// Throughput/latency statistics derived from completed segments (§4.5).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ProcessingSpeed {
    pub segments_per_minute: f64,
    pub characters_per_second: f64,
    pub avg_latency_ms: f64,
    pub min_latency_ms: f64,
    pub max_latency_ms: f64,
    /// actual throughput / ideal throughput, capped at 100.
    pub efficiency_percent: f64,
}

/// Derived, immutable projection of a Batch's progress, pushed to
/// subscribers. Monotonicity: `overall_progress` is non-decreasing across a
/// sequence of snapshots for one batch until an explicit reset (I2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub batch_id: uuid::Uuid,
    pub stage: Stage,
    pub stage_progress: f64,
    pub overall_progress: f64,
    pub elapsed_ms: i64,
    pub estimated_remaining_ms: Option<i64>,
    pub completed_count: usize,
    pub failed_count: usize,
    pub total_count: usize,
    pub current_segment_index: Option<usize>,
    pub current_segment_title: Option<String>,
    pub speed: ProcessingSpeed,
    pub last_updated: DateTime<Utc>,
}
