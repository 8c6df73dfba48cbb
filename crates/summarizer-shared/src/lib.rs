//! Shared domain model, error types, external-collaborator traits, and
//! configuration for the batch summarization orchestrator.
//!
//! This crate has no dependency on `summarizer-orchestrator` or
//! `summarizer-worker`; both depend on it. It defines the vocabulary the
//! rest of the workspace shares: what a batch, a segment, a partial
//! result are, what can go wrong, and the seams (`traits`) through which
//! concrete adapters plug in.

pub mod clock;
pub mod config;
pub mod domain;
pub mod errors;
pub mod traits;

pub use clock::{Clock, SystemClock};
pub use config::OrchestratorConfig;
pub use errors::{ErrorKind, Severity, SummarizerError, SummarizerResult};
