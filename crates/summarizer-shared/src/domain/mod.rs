//! Domain model for the batch summarization orchestrator (§3).

pub mod batch;
pub mod cancellation;
pub mod partial_result;
pub mod progress;
pub mod recovery;
pub mod segment;
pub mod segmentation;

pub use batch::{Batch, BatchStatistics, BatchStatus};
pub use cancellation::{CancellationOutcome, CancellationReason, CancellationRequest};
pub use partial_result::{
    CoverageReport, OverallQuality, PartialResult, PartialResultStatus, QualityEvaluation,
    RecommendedAction,
};
pub use progress::{ProcessingSpeed, ProgressSnapshot, Stage};
pub use recovery::{
    ComponentHealth, ComponentHealthStatus, RecoveryRecord, RecoveryStep, RecoveryStepStatus,
    SystemHealth,
};
pub use segment::{Segment, SegmentKind, SegmentStatus, SegmentTask, SegmentTaskStatus};
pub use segmentation::{SegmentationQuality, SegmentationRequest, SegmentationResult};
