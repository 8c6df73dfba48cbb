//! # Error Types
//!
//! Unified error handling for the batch summarization orchestrator and its
//! collaborators. Every error carries enough structure for the orchestrator
//! to decide whether to retry, surface to the caller, or trigger recovery.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Result type used throughout the orchestrator core.
pub type SummarizerResult<T> = Result<T, SummarizerError>;

/// Error taxonomy (§7). Each kind maps to a propagation policy in the
/// orchestrator's retry loop and recovery subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    Validation,
    Authorization,
    Network,
    Timeout,
    Service,
    Processing,
    Storage,
    System,
    Configuration,
}

/// Severity of an error, independent of its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
    Fatal,
}

/// Structured error carried through the orchestrator.
///
/// `user_message` is safe to surface to a caller; `dev_message` may contain
/// more detail but is still sanitized (no PII, no absolute paths).
#[derive(Debug, Error)]
#[error("{user_message}")]
pub struct SummarizerError {
    pub kind: ErrorKind,
    pub severity: Severity,
    pub user_message: String,
    pub dev_message: String,
    pub code: Option<String>,
    pub batch_id: Option<Uuid>,
    pub owner: Option<String>,
    pub occurred_at: DateTime<Utc>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl SummarizerError {
    pub fn new(kind: ErrorKind, severity: Severity, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind,
            severity,
            user_message: message.clone(),
            dev_message: message,
            code: None,
            batch_id: None,
            owner: None,
            occurred_at: Utc::now(),
            source: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, Severity::Error, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, Severity::Error, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, Severity::Warning, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, Severity::Warning, message)
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Service, Severity::Warning, message)
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Processing, Severity::Error, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, Severity::Error, message)
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::System, Severity::Critical, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, Severity::Fatal, message)
    }

    #[must_use]
    pub fn with_batch(mut self, batch_id: Uuid) -> Self {
        self.batch_id = Some(batch_id);
        self
    }

    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_dev_message(mut self, message: impl Into<String>) -> Self {
        self.dev_message = message.into();
        self
    }

    #[must_use]
    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Whether the retry loop (§4.4) should treat this error as retryable.
    ///
    /// Only Network and Timeout errors, plus Service errors explicitly
    /// marked transient by `is_recoverable`, are retried.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind, ErrorKind::Network | ErrorKind::Timeout)
    }

    /// Whether this error should trigger the Recovery subsystem (§4.9).
    #[must_use]
    pub fn triggers_recovery(&self) -> bool {
        matches!(self.severity, Severity::Critical | Severity::Fatal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_not_recoverable() {
        let err = SummarizerError::validation("empty segments");
        assert!(!err.is_recoverable());
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn network_and_timeout_are_recoverable() {
        assert!(SummarizerError::network("connect reset").is_recoverable());
        assert!(SummarizerError::timeout("deadline exceeded").is_recoverable());
    }

    #[test]
    fn service_is_not_recoverable_by_default() {
        assert!(!SummarizerError::service("llm 503").is_recoverable());
    }

    #[test]
    fn system_and_fatal_trigger_recovery() {
        assert!(SummarizerError::system("oom").triggers_recovery());
        assert!(SummarizerError::configuration("bad toml").triggers_recovery());
        assert!(!SummarizerError::validation("bad input").triggers_recovery());
    }

    #[test]
    fn builder_methods_set_fields() {
        let batch_id = Uuid::now_v7();
        let err = SummarizerError::processing("merge failed")
            .with_batch(batch_id)
            .with_owner("alice")
            .with_code("MERGE_FAILED");
        assert_eq!(err.batch_id, Some(batch_id));
        assert_eq!(err.owner.as_deref(), Some("alice"));
        assert_eq!(err.code.as_deref(), Some("MERGE_FAILED"));
    }

    #[test]
    fn display_uses_user_message() {
        let err = SummarizerError::validation("bad input");
        assert_eq!(format!("{err}"), "bad input");
    }
}
