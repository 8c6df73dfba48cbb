//! Batch domain type and state machine (§3, §4.1).

use super::segment::{SegmentTask, SegmentTaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a Batch.
///
/// ```text
/// Queued ──start──▶ Processing ◀─Resume─┐
///                     │   │             │
///                     │   └──Pause──▶ Paused
///                     │                 │
///             all-done│                 │Cancel
///                     ▼                 ▼
///                 Completed/Failed   Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    Queued,
    Processing,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl BatchStatus {
    /// `Cancelled` is terminal and forbids a later transition to `Completed`
    /// (I6); `Completed`/`Failed` are likewise terminal.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BatchStatus::Completed | BatchStatus::Failed | BatchStatus::Cancelled
        )
    }
}

/// Aggregate counters over a batch's SegmentTasks, refreshed on completion.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BatchStatistics {
    pub total_segments: usize,
    pub completed_segments: usize,
    pub failed_segments: usize,
    pub total_characters: usize,
}

/// One end-to-end summarization job tracked by the orchestrator.
///
/// Invariant: `Completed` requires every SegmentTask in
/// `{Completed, Failed}` and a non-empty final summary. `Cancelled` is
/// terminal and forbids a later transition to `Completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    pub owner: String,
    pub original_text: String,
    pub tasks: Vec<SegmentTask>,
    pub status: BatchStatus,
    pub concurrency_limit: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub statistics: BatchStatistics,
    pub final_summary: Option<String>,
}

impl Batch {
    pub fn new(
        id: Uuid,
        owner: impl Into<String>,
        original_text: impl Into<String>,
        tasks: Vec<SegmentTask>,
        concurrency_limit: usize,
        now: DateTime<Utc>,
    ) -> Self {
        let total_segments = tasks.len();
        let total_characters = tasks.iter().map(|t| t.segment.char_count).sum();
        Self {
            id,
            owner: owner.into(),
            original_text: original_text.into(),
            tasks,
            status: BatchStatus::Queued,
            concurrency_limit,
            started_at: now,
            completed_at: None,
            statistics: BatchStatistics {
                total_segments,
                completed_segments: 0,
                failed_segments: 0,
                total_characters,
            },
            final_summary: None,
        }
    }

    /// All tasks have reached a terminal per-task status (I1).
    #[must_use]
    pub fn all_tasks_terminal(&self) -> bool {
        self.tasks.iter().all(SegmentTask::is_terminal)
    }

    #[must_use]
    pub fn completed_task_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == SegmentTaskStatus::Completed)
            .count()
    }

    #[must_use]
    pub fn failed_task_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == SegmentTaskStatus::Failed)
            .count()
    }

    pub fn refresh_statistics(&mut self) {
        self.statistics.completed_segments = self.completed_task_count();
        self.statistics.failed_segments = self.failed_task_count();
    }
}
