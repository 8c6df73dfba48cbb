//! External collaborator contracts (§6).
//!
//! The orchestrator core depends only on these traits; concrete adapters
//! (an HTTP LLM client, a concatenation-based merger, an in-memory
//! repository, a tracing-based notification sink) live in
//! `summarizer-worker`. Per the re-architecture notes (§9), this is the
//! "small interfaces satisfied by concrete types, wired via a composition
//! root" translation of the original's constructor-injected services.

use crate::domain::{
    CancellationRequest, PartialResult, PartialResultStatus, ProgressSnapshot, SegmentTask,
};
use crate::errors::SummarizerResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Transport-level errors the core classifies and decides whether to retry
/// (§6: "The core retries Timeout and Connection; surfaces others unchanged").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarizeErrorKind {
    Timeout,
    ServiceUnavailable,
    Connection,
    Transport,
    ResponseParsing,
}

impl SummarizeErrorKind {
    /// Whether the per-task retry loop (§4.4) should retry this failure.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            SummarizeErrorKind::Timeout | SummarizeErrorKind::Connection
        )
    }
}

#[derive(Debug, Clone)]
pub struct SummarizeError {
    pub kind: SummarizeErrorKind,
    pub message: String,
}

impl std::fmt::Display for SummarizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for SummarizeError {}

/// Adapter to one LLM endpoint. The core only ever calls `summarize` and,
/// from the Concurrency Controller's periodic probes, `healthy`.
#[async_trait]
pub trait SummarizerClient: Send + Sync + std::fmt::Debug {
    async fn summarize(&self, text: &str) -> Result<String, SummarizeError>;
    async fn healthy(&self) -> bool;
}

/// A merge strategy name, passed opaquely to the Merger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeStrategy(pub String);

impl MergeStrategy {
    pub fn balanced() -> Self {
        Self("Balanced".to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MergePreferences {
    pub max_summary_chars: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct MergeOutput {
    pub summary: String,
    pub quality: f64,
    pub processing_time_ms: i64,
}

#[derive(Debug, Clone)]
pub struct PreviewOutput {
    pub summary: String,
    pub estimated_quality: f64,
    pub estimated_duration_ms: i64,
}

/// Pluggable merge algorithm (§4.1, §4.7). Treated as a collaborator: the
/// core depends only on this contract, never on a specific merge
/// implementation.
#[async_trait]
pub trait Merger: Send + Sync + std::fmt::Debug {
    async fn merge(
        &self,
        completed: &[SegmentTask],
        strategy: &MergeStrategy,
        preferences: Option<&MergePreferences>,
    ) -> SummarizerResult<MergeOutput>;

    async fn preview(
        &self,
        completed: &[SegmentTask],
        strategy: &MergeStrategy,
        preferences: Option<&MergePreferences>,
    ) -> SummarizerResult<PreviewOutput>;
}

/// Transport-agnostic sink the core publishes to (§4.6). Calls must never
/// block core logic; implementations fire-and-log-on-failure.
#[async_trait]
pub trait NotificationSink: Send + Sync + std::fmt::Debug {
    async fn progress_update(&self, batch_id: Uuid, snapshot: &ProgressSnapshot);
    async fn status_change(&self, batch_id: Uuid, status: &str, message: Option<&str>);
    async fn segment_completed(&self, batch_id: Uuid, index: usize, summary: &str);
    async fn batch_completed(&self, batch_id: Uuid, final_summary: &str);
    async fn error(&self, batch_id: Uuid, message: &str);
    async fn cancellation_requested(&self, batch_id: Uuid, request: &CancellationRequest);
    async fn partial_result_saved(&self, batch_id: Uuid, partial_id: Uuid);
    async fn recovery_completed(&self, batch_id: Uuid, success: bool, duration_ms: i64);
    async fn ui_reset(&self, batch_id: Uuid);
    async fn progress_reset(&self, batch_id: Uuid);
    async fn ui_recovery_completed(&self, batch_id: Uuid);
}

/// CRUD + query contract for persisted PartialResult rows (§6).
#[async_trait]
pub trait PartialResultRepository: Send + Sync + std::fmt::Debug {
    async fn save(&self, result: PartialResult) -> SummarizerResult<PartialResult>;
    async fn get(&self, id: Uuid) -> SummarizerResult<Option<PartialResult>>;
    async fn update_status(
        &self,
        id: Uuid,
        owner: &str,
        status: PartialResultStatus,
    ) -> SummarizerResult<()>;
    async fn list_by_owner(
        &self,
        owner: &str,
        page: usize,
        size: usize,
    ) -> SummarizerResult<Vec<PartialResult>>;
    async fn list_by_status_and_cutoff(
        &self,
        status: PartialResultStatus,
        cutoff: DateTime<Utc>,
    ) -> SummarizerResult<Vec<PartialResult>>;
    async fn cleanup_expired(&self, horizon: chrono::Duration) -> SummarizerResult<usize>;
}
