//! Cancellation request/result types (§3, §4.8).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a cancellation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancellationReason {
    UserInitiated,
    SystemTimeout,
    ResourceExhaustion,
    Admin,
    Other,
}

/// Inbound request to cancel a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationRequest {
    pub batch_id: Uuid,
    pub user: String,
    pub reason: CancellationReason,
    pub save_partial: bool,
    pub force: bool,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl CancellationRequest {
    pub fn new(batch_id: Uuid, user: impl Into<String>, reason: CancellationReason) -> Self {
        Self {
            batch_id,
            user: user.into(),
            reason,
            save_partial: false,
            force: false,
            comment: None,
            submitted_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_save_partial(mut self, save: bool) -> Self {
        self.save_partial = save;
        self
    }

    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Outcome of `CancellationService::request` (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CancellationOutcome {
    NotFound,
    Completed {
        graceful_duration_ms: i64,
        partial_saved: bool,
    },
    Forced,
}
