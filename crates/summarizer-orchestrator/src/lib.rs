//! Batch summarization orchestrator core.
//!
//! Depends only on the collaborator traits in `summarizer_shared::traits`;
//! concrete adapters (HTTP LLM client, merge strategy, notification
//! transport, persistence) live in `summarizer-worker` and are wired in
//! through [`builder::BatchOrchestratorBuilder`].

pub mod batch_orchestrator;
pub mod builder;
pub mod cancellation;
pub mod concurrency;
pub mod partial_result;
pub mod progress;
pub mod recovery;
pub mod segmenter;

pub use batch_orchestrator::BatchOrchestrator;
pub use builder::BatchOrchestratorBuilder;
pub use cancellation::{CancellationService, CancellationToken};
pub use concurrency::{ConcurrencyController, ConcurrencyStatistics, Permit};
pub use partial_result::PartialResultHandler;
pub use progress::ProgressCalculator;
pub use recovery::Recovery;
pub use segmenter::Segmenter;
