//! Segment and SegmentTask domain types (§3, §4.2).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a segment's boundaries were determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    /// One paragraph, under the length cap as-is.
    Paragraph,
    /// Sentences greedily packed into a segment under the length cap.
    Sentence,
    /// No terminator was found within the cap; split at a fixed width.
    ForcedSplit,
    /// Produced by the LLM segmentation fallback.
    LlmGenerated,
}

/// One unit of source text produced by the Segmenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub content: String,
    pub title: Option<String>,
    pub char_count: usize,
    /// Byte offsets into the (normalized) original text.
    pub start_byte: usize,
    pub end_byte: usize,
    pub kind: SegmentKind,
}

impl Segment {
    pub fn new(content: impl Into<String>, start_byte: usize, kind: SegmentKind) -> Self {
        let content = content.into();
        let char_count = content.chars().count();
        let end_byte = start_byte + content.len();
        Self {
            content,
            title: None,
            char_count,
            start_byte,
            end_byte,
            kind,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Lifecycle of one SegmentTask inside a Batch (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentTaskStatus {
    Pending,
    Processing,
    Retrying,
    Completed,
    Failed,
}

/// The per-segment unit of work inside a batch.
///
/// Invariant: `index` reflects source order and is unique within the batch;
/// `retry_count <= max_retries` (enforced by the orchestrator's retry loop);
/// `summary` is non-empty iff `status == Completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentTask {
    pub index: usize,
    pub segment: Segment,
    pub status: SegmentTaskStatus,
    pub summary: Option<String>,
    pub retry_count: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl SegmentTask {
    pub fn new(index: usize, segment: Segment) -> Self {
        Self {
            index,
            segment,
            status: SegmentTaskStatus::Pending,
            summary: None,
            retry_count: 0,
            started_at: None,
            completed_at: None,
            last_error: None,
        }
    }

    pub fn processing_duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            SegmentTaskStatus::Completed | SegmentTaskStatus::Failed
        )
    }
}

/// Read-only projection of a SegmentTask pushed to progress subscribers (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentStatus {
    pub index: usize,
    pub title: Option<String>,
    pub status: SegmentTaskStatus,
    pub retry_count: u32,
    pub last_error: Option<String>,
}

impl From<&SegmentTask> for SegmentStatus {
    fn from(task: &SegmentTask) -> Self {
        Self {
            index: task.index,
            title: task.segment.title.clone(),
            status: task.status,
            retry_count: task.retry_count,
            last_error: task.last_error.clone(),
        }
    }
}
