//! # Tracing Notification Sink (§2, §4.6)
//!
//! Logs every notification at a level matching its severity. `progress_update`
//! is the one call the core makes at high frequency; a per-batch last-sent
//! timestamp enforces the §4.6 duplicate-suppression window so a real
//! transport behind this sink (websocket fan-out, SSE, ...) isn't flooded.

use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use summarizer_shared::config::ProgressConfig;
use summarizer_shared::domain::{CancellationRequest, ProgressSnapshot, Stage};
use summarizer_shared::traits::NotificationSink;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug)]
pub struct TracingNotificationSink {
    config: ProgressConfig,
    last_progress_at: DashMap<Uuid, Instant>,
}

impl TracingNotificationSink {
    #[must_use]
    pub fn new(config: ProgressConfig) -> Self {
        Self {
            config,
            last_progress_at: DashMap::new(),
        }
    }

    /// Returns true (and records `now`) the first time a batch is seen, or
    /// once the suppression window for that batch has elapsed; otherwise
    /// leaves the stored timestamp alone and returns false.
    fn should_emit(&self, batch_id: Uuid) -> bool {
        let window = self.config.duplicate_suppression_window();
        let now = Instant::now();
        let stale = match self.last_progress_at.get(&batch_id) {
            Some(last) => now.duration_since(*last) >= window,
            None => true,
        };
        if stale {
            self.last_progress_at.insert(batch_id, now);
        }
        stale
    }
}

impl Default for TracingNotificationSink {
    fn default() -> Self {
        Self::new(ProgressConfig::default())
    }
}

#[async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn progress_update(&self, batch_id: Uuid, snapshot: &ProgressSnapshot) {
        // The terminal (Finalizing) snapshot is always delivered, even if a
        // prior update landed inside the suppression window (§4.6).
        if snapshot.stage != Stage::Finalizing && !self.should_emit(batch_id) {
            return;
        }
        info!(
            %batch_id,
            stage = ?snapshot.stage,
            overall_progress = snapshot.overall_progress,
            completed = snapshot.completed_count,
            failed = snapshot.failed_count,
            total = snapshot.total_count,
            "progress update"
        );
    }

    async fn status_change(&self, batch_id: Uuid, status: &str, message: Option<&str>) {
        info!(%batch_id, status, message, "batch status changed");
    }

    async fn segment_completed(&self, batch_id: Uuid, index: usize, summary: &str) {
        info!(%batch_id, index, summary_chars = summary.chars().count(), "segment completed");
    }

    async fn batch_completed(&self, batch_id: Uuid, final_summary: &str) {
        info!(%batch_id, summary_chars = final_summary.chars().count(), "batch completed");
    }

    async fn error(&self, batch_id: Uuid, message: &str) {
        warn!(%batch_id, message, "batch error");
    }

    async fn cancellation_requested(&self, batch_id: Uuid, request: &CancellationRequest) {
        info!(
            %batch_id,
            user = %request.user,
            reason = ?request.reason,
            force = request.force,
            save_partial = request.save_partial,
            "cancellation requested"
        );
    }

    async fn partial_result_saved(&self, batch_id: Uuid, partial_id: Uuid) {
        info!(%batch_id, %partial_id, "partial result saved");
    }

    async fn recovery_completed(&self, batch_id: Uuid, success: bool, duration_ms: i64) {
        if success {
            info!(%batch_id, duration_ms, "recovery completed");
        } else {
            warn!(%batch_id, duration_ms, "recovery completed with failures");
        }
    }

    async fn ui_reset(&self, batch_id: Uuid) {
        info!(%batch_id, "ui reset");
    }

    async fn progress_reset(&self, batch_id: Uuid) {
        self.last_progress_at.remove(&batch_id);
        info!(%batch_id, "progress reset");
    }

    async fn ui_recovery_completed(&self, batch_id: Uuid) {
        info!(%batch_id, "ui recovery completed");
    }
}
