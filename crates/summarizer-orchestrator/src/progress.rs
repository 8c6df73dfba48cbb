//! # Progress Calculator (§4.5)
//!
//! Pure, snapshot-in/snapshot-out functions over a batch's current state.
//! [`ProgressCalculator`] holds no mutable state of its own except the
//! previously-published `overall_progress`, used to enforce monotonicity (I2).

use std::sync::Mutex;

use summarizer_shared::config::ProgressConfig;
use summarizer_shared::domain::{Batch, BatchStatus, ProcessingSpeed, ProgressSnapshot, Stage};
use uuid::Uuid;

#[derive(Debug)]
pub struct ProgressCalculator {
    config: ProgressConfig,
    /// Last overall_progress published per batch, for the monotonicity guard.
    last_published: Mutex<std::collections::HashMap<Uuid, f64>>,
}

impl ProgressCalculator {
    #[must_use]
    pub fn new(config: ProgressConfig) -> Self {
        Self {
            config,
            last_published: Mutex::new(std::collections::HashMap::new()),
        }
    }

    /// Drops all monotonicity history for a batch (explicit reset, I2).
    pub fn reset(&self, batch_id: Uuid) {
        self.last_published.lock().unwrap().remove(&batch_id);
    }

    pub fn compute(&self, batch: &Batch, stage: Stage, elapsed_ms: i64) -> ProgressSnapshot {
        let total = batch.statistics.total_segments;
        let completed = batch.completed_task_count();
        let failed = batch.failed_task_count();

        let stage_progress = self.stage_progress(batch, stage, total, completed);
        let mut overall_progress = self.overall_progress(batch, stage, stage_progress, total, completed);

        {
            let mut last = self.last_published.lock().unwrap();
            let entry = last.entry(batch.id).or_insert(0.0);
            if overall_progress < *entry {
                overall_progress = *entry;
            } else {
                *entry = overall_progress;
            }
        }

        let speed = self.speed(batch, elapsed_ms);
        let estimated_remaining_ms = self.eta(stage, total, completed, elapsed_ms, &speed);
        let current = batch
            .tasks
            .iter()
            .find(|t| t.status == summarizer_shared::domain::SegmentTaskStatus::Processing);

        ProgressSnapshot {
            batch_id: batch.id,
            stage,
            stage_progress,
            overall_progress,
            elapsed_ms,
            estimated_remaining_ms,
            completed_count: completed,
            failed_count: failed,
            total_count: total,
            current_segment_index: current.map(|t| t.index),
            current_segment_title: current.and_then(|t| t.segment.title.clone()),
            speed,
            last_updated: chrono::Utc::now(),
        }
    }

    fn stage_progress(&self, batch: &Batch, stage: Stage, total: usize, completed: usize) -> f64 {
        match stage {
            Stage::Initializing | Stage::Segmenting | Stage::Finalizing => 100.0,
            Stage::BatchProcessing => {
                if total == 0 {
                    return 100.0;
                }
                let base = 100.0 * completed as f64 / total as f64;
                let partial = batch
                    .tasks
                    .iter()
                    .find(|t| t.status == summarizer_shared::domain::SegmentTaskStatus::Processing)
                    .map(|_| 100.0 / total as f64 * 0.5)
                    .unwrap_or(0.0);
                (base + partial).min(100.0)
            }
            Stage::Merging => {
                if total == 0 {
                    100.0
                } else {
                    100.0 * completed as f64 / total as f64
                }
            }
        }
    }

    fn overall_progress(
        &self,
        batch: &Batch,
        stage: Stage,
        stage_progress: f64,
        total: usize,
        completed: usize,
    ) -> f64 {
        match batch.status {
            BatchStatus::Completed => return 100.0,
            BatchStatus::Failed => {
                return if total == 0 {
                    0.0
                } else {
                    100.0 * completed as f64 / total as f64
                };
            }
            _ => {}
        }

        let mut total_weighted = 0.0;
        for s in Stage::ALL {
            let weight = self.config.weight_for(s);
            let progress = if rank(s) < rank(stage) {
                100.0
            } else if s == stage {
                stage_progress
            } else {
                0.0
            };
            total_weighted += weight / 100.0 * progress;
        }
        total_weighted
    }

    fn speed(&self, batch: &Batch, elapsed_ms: i64) -> ProcessingSpeed {
        let completed_tasks: Vec<_> = batch
            .tasks
            .iter()
            .filter(|t| t.status == summarizer_shared::domain::SegmentTaskStatus::Completed)
            .collect();

        if completed_tasks.is_empty() || elapsed_ms <= 0 {
            return ProcessingSpeed::default();
        }

        let elapsed_minutes = elapsed_ms as f64 / 60_000.0;
        let elapsed_seconds = elapsed_ms as f64 / 1_000.0;
        let segments_per_minute = if elapsed_minutes > 0.0 {
            completed_tasks.len() as f64 / elapsed_minutes
        } else {
            0.0
        };
        let total_chars: usize = completed_tasks.iter().map(|t| t.segment.char_count).sum();
        let characters_per_second = if elapsed_seconds > 0.0 {
            total_chars as f64 / elapsed_seconds
        } else {
            0.0
        };

        let latencies: Vec<f64> = completed_tasks
            .iter()
            .filter_map(|t| t.processing_duration())
            .map(|d| d.num_milliseconds() as f64)
            .collect();
        let avg_latency_ms = if latencies.is_empty() {
            0.0
        } else {
            latencies.iter().sum::<f64>() / latencies.len() as f64
        };
        let min_latency_ms = latencies.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_latency_ms = latencies.iter().cloned().fold(0.0, f64::max);

        let ideal_throughput = if avg_latency_ms > 0.0 {
            1000.0 / avg_latency_ms
        } else {
            0.0
        };
        let actual_throughput = segments_per_minute / 60.0;
        let efficiency_percent = if ideal_throughput > 0.0 {
            (actual_throughput / ideal_throughput * 100.0).min(100.0)
        } else {
            0.0
        };

        ProcessingSpeed {
            segments_per_minute,
            characters_per_second,
            avg_latency_ms,
            min_latency_ms: if min_latency_ms.is_finite() { min_latency_ms } else { 0.0 },
            max_latency_ms,
            efficiency_percent,
        }
    }

    fn eta(
        &self,
        stage: Stage,
        total: usize,
        completed: usize,
        elapsed_ms: i64,
        speed: &ProcessingSpeed,
    ) -> Option<i64> {
        if completed == 0 || elapsed_ms == 0 {
            return None;
        }
        let remaining = total.saturating_sub(completed);
        if remaining == 0 {
            return Some(0);
        }
        let avg_per_segment_ms = elapsed_ms as f64 / completed as f64;
        let multiplier = self.config.time_multiplier_for(stage);
        let _ = speed;
        Some((avg_per_segment_ms * remaining as f64 * multiplier * 1.1).round() as i64)
    }
}

fn rank(stage: Stage) -> u8 {
    match stage {
        Stage::Initializing => 0,
        Stage::Segmenting => 1,
        Stage::BatchProcessing => 2,
        Stage::Merging => 3,
        Stage::Finalizing => 4,
    }
}
