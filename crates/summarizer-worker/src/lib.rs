//! Concrete adapters for the orchestrator core's external collaborators
//! (§6): an HTTP LLM client, a default ordered-concatenation merger, a
//! `tracing`-based notification sink, and an in-memory partial-result
//! repository. None of these are required by the core — they exist so the
//! crate is buildable and testable end-to-end without a live LLM, database,
//! or push transport, and as the concrete types a real deployment's
//! composition root would replace one at a time.

pub mod http_client;
pub mod merger;
pub mod notifications;
pub mod repository;

pub use http_client::{HttpClientConfig, HttpSummarizerClient};
pub use merger::BalancedMerger;
pub use notifications::TracingNotificationSink;
pub use repository::InMemoryPartialResultRepository;
