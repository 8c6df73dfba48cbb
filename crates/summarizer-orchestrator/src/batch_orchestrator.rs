//! # Batch Orchestrator (§4.1, §4.4)
//!
//! The central per-batch state machine. Each batch is driven by exactly
//! one background task spawned from `start_batch`; everything else
//! (`progress`, `pause`, `cancel`, ...) only reads an `RwLock`-guarded
//! snapshot or sends a signal, never mutates `Batch` directly (§5: "the
//! Batch and its SegmentTasks are mutated only by the batch's own
//! orchestrator task").

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use summarizer_shared::clock::Clock;
use summarizer_shared::config::OrchestratorConfig;
use summarizer_shared::domain::{
    Batch, BatchStatus, CancellationOutcome, CancellationRequest, ProgressSnapshot,
    RecoveryRecord, Segment, SegmentTask, SegmentTaskStatus, Stage,
};
use summarizer_shared::errors::{SummarizerError, SummarizerResult};
use summarizer_shared::traits::{MergeStrategy, Merger, NotificationSink, SummarizerClient};
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::cancellation::{CancellationService, CancellationToken};
use crate::concurrency::ConcurrencyController;
use crate::partial_result::PartialResultHandler;
use crate::progress::ProgressCalculator;
use crate::recovery::Recovery;

struct BatchHandle {
    batch: RwLock<Batch>,
    pause_tx: watch::Sender<bool>,
    pause_rx: watch::Receiver<bool>,
    token: CancellationToken,
    stage: Mutex<Stage>,
}

pub struct BatchOrchestrator {
    config: Arc<OrchestratorConfig>,
    clock: Arc<dyn Clock>,
    client: Arc<dyn SummarizerClient>,
    merger: Arc<dyn Merger>,
    notifications: Arc<dyn NotificationSink>,
    concurrency: Arc<ConcurrencyController>,
    progress_calculator: Arc<ProgressCalculator>,
    cancellation: Arc<CancellationService>,
    partial_results: Arc<PartialResultHandler>,
    recovery: Arc<Recovery>,
    batches: Mutex<HashMap<Uuid, Arc<BatchHandle>>>,
}

impl BatchOrchestrator {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<OrchestratorConfig>,
        clock: Arc<dyn Clock>,
        client: Arc<dyn SummarizerClient>,
        merger: Arc<dyn Merger>,
        notifications: Arc<dyn NotificationSink>,
        concurrency: Arc<ConcurrencyController>,
        progress_calculator: Arc<ProgressCalculator>,
        cancellation: Arc<CancellationService>,
        partial_results: Arc<PartialResultHandler>,
        recovery: Arc<Recovery>,
    ) -> Arc<Self> {
        let adjustment_interval = config.concurrency.adjustment_interval;
        let orchestrator = Arc::new(Self {
            config,
            clock: Arc::clone(&clock),
            client,
            merger,
            notifications,
            concurrency: Arc::clone(&concurrency),
            progress_calculator,
            cancellation,
            partial_results,
            recovery,
            batches: Mutex::new(HashMap::new()),
        });

        tokio::spawn(run_adjustment_loop(concurrency, clock, adjustment_interval));

        orchestrator
    }

    /// `StartBatch` (§4.1): validates input, registers the batch, and
    /// spawns its processing task. Returns immediately.
    pub async fn start_batch(
        self: &Arc<Self>,
        segments: Vec<Segment>,
        original_text: impl Into<String>,
        owner: impl Into<String>,
        concurrency_hint: Option<usize>,
    ) -> SummarizerResult<Uuid> {
        let original_text = original_text.into();
        let owner = owner.into();
        if segments.is_empty() || original_text.is_empty() {
            return Err(SummarizerError::validation(
                "batch requires at least one segment and non-empty source text",
            ));
        }

        let tasks: Vec<SegmentTask> = segments
            .into_iter()
            .enumerate()
            .map(|(i, seg)| SegmentTask::new(i, seg))
            .collect();

        let batch_id = Uuid::now_v7();
        let concurrency_limit =
            concurrency_hint.unwrap_or(self.config.concurrency.default_concurrent_limit);
        let mut batch = Batch::new(
            batch_id,
            owner,
            original_text,
            tasks,
            concurrency_limit,
            self.clock.now(),
        );
        batch.status = BatchStatus::Queued;

        let token = self.cancellation.register(batch_id).await;
        let (pause_tx, pause_rx) = watch::channel(false);
        let handle = Arc::new(BatchHandle {
            batch: RwLock::new(batch),
            pause_tx,
            pause_rx,
            token,
            stage: Mutex::new(Stage::Initializing),
        });

        self.batches.lock().await.insert(batch_id, Arc::clone(&handle));

        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            orchestrator.run_batch(batch_id, handle).await;
        });

        Ok(batch_id)
    }

    pub async fn progress(&self, batch_id: Uuid) -> Option<ProgressSnapshot> {
        let handle = self.handle(batch_id).await?;
        Some(self.snapshot(&handle).await)
    }

    pub async fn result(&self, batch_id: Uuid) -> Option<Batch> {
        let handle = self.handle(batch_id).await?;
        Some(handle.batch.read().await.clone())
    }

    /// Legal only when status=Processing (§4.1).
    pub async fn pause(&self, batch_id: Uuid) -> bool {
        let Some(handle) = self.handle(batch_id).await else {
            return false;
        };
        let mut batch = handle.batch.write().await;
        if batch.status != BatchStatus::Processing {
            return false;
        }
        batch.status = BatchStatus::Paused;
        drop(batch);
        let _ = handle.pause_tx.send(true);
        self.notifications.status_change(batch_id, "Paused", None).await;
        true
    }

    /// Legal only when status=Paused (§4.1).
    pub async fn resume(&self, batch_id: Uuid) -> bool {
        let Some(handle) = self.handle(batch_id).await else {
            return false;
        };
        let mut batch = handle.batch.write().await;
        if batch.status != BatchStatus::Paused {
            return false;
        }
        batch.status = BatchStatus::Processing;
        drop(batch);
        let _ = handle.pause_tx.send(false);
        self.notifications
            .status_change(batch_id, "Processing", None)
            .await;
        true
    }

    /// Legal in any non-terminal state; delegates to the Cancellation
    /// Service (§4.8). Idempotent: a second call against a batch already
    /// `Cancelled` returns true with no further side effects (§8), and an
    /// unknown batch id returns false rather than erroring.
    pub async fn cancel(&self, request: CancellationRequest) -> bool {
        let batch_id = request.batch_id;

        let handle_for_save = self.handle(batch_id).await;
        if let Some(handle) = &handle_for_save {
            if handle.batch.read().await.status == BatchStatus::Cancelled {
                return true;
            }
        }

        self.notifications.cancellation_requested(batch_id, &request).await;

        let partial_results = Arc::clone(&self.partial_results);
        let notifications = Arc::clone(&self.notifications);
        let owner = request.user.clone();
        let save_partial = request.save_partial;

        let outcome = self
            .cancellation
            .request(request, || async move {
                if !save_partial {
                    return false;
                }
                let Some(handle) = handle_for_save else {
                    return false;
                };
                let batch = handle.batch.read().await;
                let completed = PartialResultHandler::collect_completed(&batch.tasks);
                let total = batch.statistics.total_segments;
                let result = partial_results
                    .process_partial_result(batch_id, owner, &completed, total)
                    .await;
                let partial_id = result.id;
                let saved = partial_results.save(result).await.is_ok();
                if saved {
                    notifications.partial_result_saved(batch_id, partial_id).await;
                }
                saved
            })
            .await;

        // The batch's own orchestrator task (`run_batch`) observes the
        // cancellation token and sets the terminal status; this method
        // never mutates `Batch` directly.
        !matches!(outcome, CancellationOutcome::NotFound)
    }

    /// Most recent first by start time (§4.1).
    pub async fn list_by_owner(&self, owner: &str, page: usize, size: usize) -> Vec<ProgressSnapshot> {
        let batches = self.batches.lock().await;
        let mut owned: Vec<Arc<BatchHandle>> = Vec::new();
        for handle in batches.values() {
            if handle.batch.read().await.owner == owner {
                owned.push(Arc::clone(handle));
            }
        }
        drop(batches);

        let mut with_start: Vec<(chrono::DateTime<Utc>, Arc<BatchHandle>)> = Vec::new();
        for handle in owned {
            let started_at = handle.batch.read().await.started_at;
            with_start.push((started_at, handle));
        }
        with_start.sort_by(|a, b| b.0.cmp(&a.0));

        let mut snapshots = Vec::new();
        for (_, handle) in with_start.into_iter().skip(page * size).take(size) {
            snapshots.push(self.snapshot(&handle).await);
        }
        snapshots
    }

    /// Runs a recovery pass for one batch if it qualifies (§4.9). Meant to
    /// be driven by a periodic reconciliation loop outside the hot path,
    /// not called inline from the worker loop.
    pub async fn reconcile(&self, batch_id: Uuid) -> Option<RecoveryRecord> {
        let handle = self.handle(batch_id).await?;
        let cancellation_requested = handle.token.is_requested();
        let mut batch = handle.batch.write().await;
        if !self.recovery.requires_recovery(&batch, cancellation_requested).await {
            return None;
        }
        Some(self.recovery.recover(&mut batch, "stale batch detected during reconciliation").await)
    }

    async fn handle(&self, batch_id: Uuid) -> Option<Arc<BatchHandle>> {
        self.batches.lock().await.get(&batch_id).cloned()
    }

    async fn snapshot(&self, handle: &BatchHandle) -> ProgressSnapshot {
        let batch = handle.batch.read().await;
        let stage = *handle.stage.lock().await;
        let elapsed_ms = (self.clock.now() - batch.started_at).num_milliseconds();
        self.progress_calculator.compute(&batch, stage, elapsed_ms)
    }

    async fn set_stage(&self, handle: &BatchHandle, stage: Stage) {
        *handle.stage.lock().await = stage;
    }

    async fn publish_progress(&self, batch_id: Uuid, handle: &BatchHandle) {
        let snapshot = self.snapshot(handle).await;
        self.notifications.progress_update(batch_id, &snapshot).await;
    }

    /// Drives one batch end to end: Segmenting is a no-op here (segments
    /// arrive pre-computed from `start_batch`'s caller, per §4.1's
    /// `StartBatch(segments, ...)` contract) through BatchProcessing,
    /// Merging, Finalizing.
    async fn run_batch(self: Arc<Self>, batch_id: Uuid, handle: Arc<BatchHandle>) {
        {
            let mut batch = handle.batch.write().await;
            batch.status = BatchStatus::Processing;
        }
        self.set_stage(&handle, Stage::Segmenting).await;
        self.publish_progress(batch_id, &handle).await;

        self.set_stage(&handle, Stage::BatchProcessing).await;
        let total = handle.batch.read().await.tasks.len();

        let mut join_handles = Vec::with_capacity(total);
        for index in 0..total {
            if handle.token.is_forced() {
                break;
            }
            let permit = self.concurrency.acquire(&batch_id.to_string()).await;
            let orchestrator = Arc::clone(&self);
            let task_handle = Arc::clone(&handle);
            join_handles.push(tokio::spawn(async move {
                orchestrator.run_segment_task(batch_id, &task_handle, index).await;
                drop(permit);
            }));
        }

        for jh in join_handles {
            let _ = jh.await;
        }

        if handle.token.is_requested() {
            let mut batch = handle.batch.write().await;
            if !batch.status.is_terminal() {
                batch.status = BatchStatus::Cancelled;
                batch.completed_at = Some(self.clock.now());
            }
        } else {
            self.finalize(batch_id, &handle).await;
        }

        self.progress_calculator.reset(batch_id);
        self.cancellation.unregister(batch_id).await;
        // The handle stays in the registry after reaching a terminal state
        // (§4.1: `result()` must answer for a finished batch); there is no
        // TTL/cleanup policy evicting it yet.
    }

    async fn run_segment_task(&self, batch_id: Uuid, handle: &BatchHandle, index: usize) {
        let retry_config = self.config.retry;
        let mut attempt = 0u32;

        loop {
            // Pause: wait cooperatively until Resume or Cancel.
            let mut pause_rx = handle.pause_rx.clone();
            while *pause_rx.borrow() {
                if handle.token.is_requested() {
                    break;
                }
                if pause_rx.changed().await.is_err() {
                    break;
                }
            }

            if handle.token.is_forced() {
                return;
            }
            if handle.token.is_requested() {
                // Graceful cancel defers at non-checkpoint boundaries; since
                // we're between attempts (a safe checkpoint), cooperate now.
                return;
            }

            {
                let mut batch = handle.batch.write().await;
                batch.tasks[index].status = SegmentTaskStatus::Processing;
                batch.tasks[index].started_at = Some(self.clock.now());
            }

            let content = {
                let batch = handle.batch.read().await;
                batch.tasks[index].segment.content.clone()
            };

            handle.token.set_checkpoint(false);
            let started = self.clock.now();
            let outcome = tokio::select! {
                result = self.client.summarize(&content) => Outcome::Call(result),
                () = force_watch(&handle.token) => Outcome::Forced,
            };
            handle.token.set_checkpoint(true);
            let latency = self.clock.now() - started;

            match outcome {
                Outcome::Forced => return,
                Outcome::Call(Ok(summary)) => {
                    self.concurrency
                        .record_outcome(latency.to_std().unwrap_or_default(), true)
                        .await;
                    {
                        let mut batch = handle.batch.write().await;
                        batch.tasks[index].status = SegmentTaskStatus::Completed;
                        batch.tasks[index].summary = Some(summary.clone());
                        batch.tasks[index].completed_at = Some(self.clock.now());
                        batch.refresh_statistics();
                    }
                    self.notifications.segment_completed(batch_id, index, &summary).await;
                    self.publish_progress(batch_id, handle).await;
                    return;
                }
                Outcome::Call(Err(err)) => {
                    self.concurrency
                        .record_outcome(latency.to_std().unwrap_or_default(), false)
                        .await;
                    warn!(batch_id = %batch_id, index, error = %err, attempt, "segment summarization failed");
                    {
                        let mut batch = handle.batch.write().await;
                        batch.tasks[index].last_error = Some(err.to_string());
                    }

                    if !err.kind.is_retryable() || attempt >= retry_config.max_retries {
                        let mut batch = handle.batch.write().await;
                        batch.tasks[index].status = SegmentTaskStatus::Failed;
                        batch.refresh_statistics();
                        return;
                    }

                    {
                        let mut batch = handle.batch.write().await;
                        batch.tasks[index].status = SegmentTaskStatus::Retrying;
                        batch.tasks[index].retry_count += 1;
                    }
                    let backoff = retry_config.backoff_for_attempt(attempt);
                    attempt += 1;
                    self.clock.sleep(backoff).await;
                }
            }
        }
    }

    /// Runs the merge step (when ≥1 task Completed) and sets the terminal
    /// status (§4.1).
    async fn finalize(&self, batch_id: Uuid, handle: &BatchHandle) {
        let completed_count = handle.batch.read().await.completed_task_count();

        if completed_count == 0 {
            let mut batch = handle.batch.write().await;
            batch.status = BatchStatus::Failed;
            batch.completed_at = Some(self.clock.now());
            drop(batch);
            self.notifications
                .error(batch_id, "no segment completed; batch failed")
                .await;
            self.publish_progress(batch_id, handle).await;
            return;
        }

        self.set_stage(handle, Stage::Merging).await;
        self.publish_progress(batch_id, handle).await;

        let completed_tasks: Vec<SegmentTask> = {
            let batch = handle.batch.read().await;
            PartialResultHandler::collect_completed(&batch.tasks)
                .into_iter()
                .cloned()
                .collect()
        };

        match self
            .merger
            .merge(&completed_tasks, &MergeStrategy::balanced(), None)
            .await
        {
            Ok(output) => {
                let mut batch = handle.batch.write().await;
                batch.final_summary = Some(output.summary.clone());
                batch.status = BatchStatus::Completed;
                batch.completed_at = Some(self.clock.now());
                drop(batch);
                self.set_stage(handle, Stage::Finalizing).await;
                self.publish_progress(batch_id, handle).await;
                self.notifications.batch_completed(batch_id, &output.summary).await;
                info!(batch_id = %batch_id, "batch completed");
            }
            Err(err) => {
                let mut batch = handle.batch.write().await;
                batch.status = BatchStatus::Failed;
                batch.completed_at = Some(self.clock.now());
                drop(batch);
                self.notifications.error(batch_id, &err.to_string()).await;
                self.publish_progress(batch_id, handle).await;
            }
        }
    }
}

/// Drives the Concurrency Controller's periodic re-evaluation (§4.3). Runs
/// for the orchestrator's lifetime; there is one of these per orchestrator,
/// not per batch, since concurrency is metered across all in-flight calls.
async fn run_adjustment_loop(
    concurrency: Arc<ConcurrencyController>,
    clock: Arc<dyn Clock>,
    interval: std::time::Duration,
) {
    loop {
        clock.sleep(interval).await;
        concurrency.adjust_once().await;
    }
}

enum Outcome<T> {
    Call(T),
    Forced,
}

async fn force_watch(token: &CancellationToken) {
    let mut rx = token.force_receiver();
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;
    use summarizer_shared::clock::SystemClock;
    use summarizer_shared::config::{CancellationConfig, RetryConfig};
    use summarizer_shared::domain::{
        CancellationReason, PartialResultStatus, SegmentKind,
    };
    use summarizer_shared::errors::SummarizerResult as Result_;
    use summarizer_shared::traits::{
        MergeOutput, MergePreferences, PreviewOutput, SummarizeError, SummarizeErrorKind,
    };

    #[derive(Debug)]
    struct EchoClient {
        always_fails: bool,
        delay: StdDuration,
    }

    #[async_trait]
    impl SummarizerClient for EchoClient {
        async fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.always_fails {
                return Err(SummarizeError {
                    kind: SummarizeErrorKind::Timeout,
                    message: "stub timeout".into(),
                });
            }
            Ok(format!("summary({text})"))
        }
        async fn healthy(&self) -> bool {
            true
        }
    }

    #[derive(Debug)]
    struct ConcatMerger;

    #[async_trait]
    impl Merger for ConcatMerger {
        async fn merge(
            &self,
            completed: &[SegmentTask],
            _strategy: &MergeStrategy,
            _preferences: Option<&MergePreferences>,
        ) -> Result_<MergeOutput> {
            Ok(MergeOutput {
                summary: completed
                    .iter()
                    .filter_map(|t| t.summary.clone())
                    .collect::<Vec<_>>()
                    .join(" | "),
                quality: 0.9,
                processing_time_ms: 1,
            })
        }

        async fn preview(
            &self,
            _completed: &[SegmentTask],
            _strategy: &MergeStrategy,
            _preferences: Option<&MergePreferences>,
        ) -> Result_<PreviewOutput> {
            Ok(PreviewOutput {
                summary: "preview".into(),
                estimated_quality: 0.8,
                estimated_duration_ms: 1,
            })
        }
    }

    #[derive(Debug, Default)]
    struct CountingSink {
        batch_completed: AtomicUsize,
    }

    #[async_trait]
    impl NotificationSink for CountingSink {
        async fn progress_update(&self, _batch_id: Uuid, _snapshot: &ProgressSnapshot) {}
        async fn status_change(&self, _batch_id: Uuid, _status: &str, _message: Option<&str>) {}
        async fn segment_completed(&self, _batch_id: Uuid, _index: usize, _summary: &str) {}
        async fn batch_completed(&self, _batch_id: Uuid, _final_summary: &str) {
            self.batch_completed.fetch_add(1, Ordering::SeqCst);
        }
        async fn error(&self, _batch_id: Uuid, _message: &str) {}
        async fn cancellation_requested(&self, _batch_id: Uuid, _request: &CancellationRequest) {}
        async fn partial_result_saved(&self, _batch_id: Uuid, _partial_id: Uuid) {}
        async fn recovery_completed(&self, _batch_id: Uuid, _success: bool, _duration_ms: i64) {}
        async fn ui_reset(&self, _batch_id: Uuid) {}
        async fn progress_reset(&self, _batch_id: Uuid) {}
        async fn ui_recovery_completed(&self, _batch_id: Uuid) {}
    }

    #[derive(Debug, Default)]
    struct NoopRepository;

    #[async_trait]
    impl summarizer_shared::traits::PartialResultRepository for NoopRepository {
        async fn save(
            &self,
            result: summarizer_shared::domain::PartialResult,
        ) -> Result_<summarizer_shared::domain::PartialResult> {
            Ok(result)
        }
        async fn get(&self, _id: Uuid) -> Result_<Option<summarizer_shared::domain::PartialResult>> {
            Ok(None)
        }
        async fn update_status(&self, _id: Uuid, _owner: &str, _status: PartialResultStatus) -> Result_<()> {
            Ok(())
        }
        async fn list_by_owner(
            &self,
            _owner: &str,
            _page: usize,
            _size: usize,
        ) -> Result_<Vec<summarizer_shared::domain::PartialResult>> {
            Ok(vec![])
        }
        async fn list_by_status_and_cutoff(
            &self,
            _status: PartialResultStatus,
            _cutoff: chrono::DateTime<Utc>,
        ) -> Result_<Vec<summarizer_shared::domain::PartialResult>> {
            Ok(vec![])
        }
        async fn cleanup_expired(&self, _horizon: chrono::Duration) -> Result_<usize> {
            Ok(0)
        }
    }

    fn segments(n: usize) -> Vec<Segment> {
        (0..n)
            .map(|i| Segment::new(format!("segment {i}"), 0, SegmentKind::Sentence))
            .collect()
    }

    fn orchestrator(always_fails: bool, max_retries: u32) -> Arc<BatchOrchestrator> {
        orchestrator_with_delay(always_fails, max_retries, StdDuration::ZERO)
    }

    fn orchestrator_with_delay(
        always_fails: bool,
        max_retries: u32,
        delay: StdDuration,
    ) -> Arc<BatchOrchestrator> {
        let mut config = OrchestratorConfig::default();
        config.retry = RetryConfig {
            max_retries,
            base_delay_seconds: 0.01,
            backoff_multiplier: 1.0,
        };
        config.cancellation = CancellationConfig {
            graceful_timeout_seconds: 1,
            checkpoint_poll_ms: 5,
        };
        let config = Arc::new(config);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let client: Arc<dyn SummarizerClient> = Arc::new(EchoClient { always_fails, delay });
        let merger: Arc<dyn Merger> = Arc::new(ConcatMerger);
        let notifications: Arc<dyn NotificationSink> = Arc::new(CountingSink::default());
        let repository: Arc<dyn summarizer_shared::traits::PartialResultRepository> =
            Arc::new(NoopRepository);
        let concurrency = Arc::new(ConcurrencyController::new(config.concurrency.clone()));
        let progress_calculator = Arc::new(ProgressCalculator::new(config.progress.clone()));
        let cancellation = Arc::new(CancellationService::new(config.cancellation.clone(), Arc::clone(&clock)));
        let partial_results = Arc::new(PartialResultHandler::new(
            config.partial_result.clone(),
            Arc::clone(&merger),
            Arc::clone(&repository),
        ));
        let recovery = Arc::new(Recovery::new(Arc::clone(&clock), repository, Arc::clone(&notifications)));

        BatchOrchestrator::new(
            config,
            clock,
            client,
            merger,
            notifications,
            concurrency,
            progress_calculator,
            cancellation,
            partial_results,
            recovery,
        )
    }

    async fn wait_for_terminal(orchestrator: &Arc<BatchOrchestrator>, batch_id: Uuid) -> Batch {
        for _ in 0..200 {
            if let Some(batch) = orchestrator.result(batch_id).await {
                if batch.status.is_terminal() {
                    return batch;
                }
            }
            tokio::time::sleep(StdDuration::from_millis(10)).await;
        }
        panic!("batch never reached a terminal status");
    }

    #[tokio::test]
    async fn happy_path_completes_and_merges_all_segments() {
        let orchestrator = orchestrator(false, 3);
        let batch_id = orchestrator
            .start_batch(segments(3), "full source text", "alice", None)
            .await
            .unwrap();

        let batch = wait_for_terminal(&orchestrator, batch_id).await;
        assert_eq!(batch.status, BatchStatus::Completed);
        assert!(batch.final_summary.unwrap().contains("summary("));
        assert_eq!(batch.completed_task_count(), 3);
    }

    #[tokio::test]
    async fn all_segments_failing_yields_failed_batch_with_no_merge() {
        let orchestrator = orchestrator(true, 0);
        let batch_id = orchestrator
            .start_batch(segments(2), "full source text", "bob", None)
            .await
            .unwrap();

        let batch = wait_for_terminal(&orchestrator, batch_id).await;
        assert_eq!(batch.status, BatchStatus::Failed);
        assert!(batch.final_summary.is_none());
    }

    #[tokio::test]
    async fn pause_then_resume_returns_to_processing_and_completes() {
        let orchestrator = orchestrator(false, 3);
        let batch_id = orchestrator
            .start_batch(segments(1), "full source text", "carol", None)
            .await
            .unwrap();

        // Give the worker a moment to reach Processing before pausing.
        tokio::time::sleep(StdDuration::from_millis(5)).await;
        let _ = orchestrator.pause(batch_id).await;
        let _ = orchestrator.resume(batch_id).await;

        let batch = wait_for_terminal(&orchestrator, batch_id).await;
        assert_eq!(batch.status, BatchStatus::Completed);
    }

    #[tokio::test]
    async fn force_cancel_ends_batch_as_cancelled() {
        let orchestrator = orchestrator_with_delay(false, 3, StdDuration::from_millis(300));
        let batch_id = orchestrator
            .start_batch(segments(4), "full source text", "dave", None)
            .await
            .unwrap();

        // Let the in-flight segments start their (slow) summarize calls
        // before force-cancelling, so the interrupt actually has something
        // to interrupt.
        tokio::time::sleep(StdDuration::from_millis(20)).await;
        let request = CancellationRequest::new(batch_id, "dave", CancellationReason::UserInitiated)
            .with_force(true);
        assert!(orchestrator.cancel(request).await);

        let batch = wait_for_terminal(&orchestrator, batch_id).await;
        assert_eq!(batch.status, BatchStatus::Cancelled);
    }

    #[tokio::test]
    async fn cancel_of_unknown_batch_returns_false() {
        let orchestrator = orchestrator(false, 3);
        let request = CancellationRequest::new(Uuid::now_v7(), "eve", CancellationReason::UserInitiated);
        assert!(!orchestrator.cancel(request).await);
    }
}
