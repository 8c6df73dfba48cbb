//! Partial-result and quality-evaluation types (§3, §4.7).

use super::segment::SegmentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse coverage of the completed-index set over the segment range (§4.7).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CoverageReport {
    pub beginning_coverage: f64,
    pub middle_coverage: f64,
    pub end_coverage: f64,
    pub max_continuous_length: usize,
    pub coverage_gaps: usize,
}

/// Bucketed overall assessment of a partial result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OverallQuality {
    Unusable,
    Poor,
    Acceptable,
    Good,
    Excellent,
}

impl OverallQuality {
    /// `0.7*completeness + 0.3*coherence` with thresholds 0.2/0.4/0.6/0.8 (§4.7).
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            OverallQuality::Excellent
        } else if score >= 0.6 {
            OverallQuality::Good
        } else if score >= 0.4 {
            OverallQuality::Acceptable
        } else if score >= 0.2 {
            OverallQuality::Poor
        } else {
            OverallQuality::Unusable
        }
    }
}

/// What the caller should do with a partial result, mapped from its
/// `OverallQuality` (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendedAction {
    Discard,
    ConsiderContinue,
    ReviewRequired,
    Recommend,
}

impl From<OverallQuality> for RecommendedAction {
    fn from(quality: OverallQuality) -> Self {
        match quality {
            OverallQuality::Unusable => RecommendedAction::Discard,
            OverallQuality::Poor => RecommendedAction::ConsiderContinue,
            OverallQuality::Acceptable => RecommendedAction::ReviewRequired,
            OverallQuality::Good | OverallQuality::Excellent => RecommendedAction::Recommend,
        }
    }
}

/// Quality evaluation of a partial result, produced by
/// `PartialResultHandler::evaluate` (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityEvaluation {
    pub completeness: f64,
    pub coverage: CoverageReport,
    pub coherence: f64,
    pub missing_topics: Vec<String>,
    pub overall_quality: OverallQuality,
    pub recommended_action: RecommendedAction,
    pub warnings: Vec<String>,
}

/// Lifecycle of a PartialResult once it has been persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartialResultStatus {
    Processing,
    PendingUserDecision,
    Accepted,
    Rejected,
    Expired,
    Failed,
}

/// The summary assembled from whichever segments completed before
/// cancellation, with a quality evaluation (§3, §4.7).
///
/// Invariant: `completion_percentage == 100 * completed / total` at all
/// times (I5); expiration is automatic past the configured horizon when
/// `status == PendingUserDecision`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialResult {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub owner: String,
    pub completed_segments: Vec<SegmentStatus>,
    pub total_segments: usize,
    pub completion_percentage: f64,
    pub partial_summary: String,
    /// First 200 chars of the original content of up to three completed
    /// segments, so a reviewer can sanity-check the summary against the
    /// source without pulling the whole document (§4.7).
    pub original_text_sample: Vec<String>,
    pub quality: QualityEvaluation,
    pub cancelled_at: DateTime<Utc>,
    pub status: PartialResultStatus,
    pub user_comment: Option<String>,
    pub accepted_at: Option<DateTime<Utc>>,
}

impl PartialResult {
    #[must_use]
    pub fn can_continue_from(&self) -> bool {
        self.quality.overall_quality >= OverallQuality::Acceptable && self.quality.completeness >= 0.3
    }
}
