//! # Composition Root (§4.10)
//!
//! Wires the core state machine to its collaborators. Per the
//! re-architecture notes (§9), this replaces the original's
//! constructor-injected service locator with an explicit builder: every
//! collaborator the core needs is a trait object supplied here, nothing
//! is looked up implicitly at call time.

use std::sync::Arc;

use summarizer_shared::clock::{Clock, SystemClock};
use summarizer_shared::config::OrchestratorConfig;
use summarizer_shared::traits::{Merger, NotificationSink, PartialResultRepository, SummarizerClient};

use crate::batch_orchestrator::BatchOrchestrator;
use crate::cancellation::CancellationService;
use crate::concurrency::ConcurrencyController;
use crate::partial_result::PartialResultHandler;
use crate::progress::ProgressCalculator;
use crate::recovery::Recovery;

/// Builds a [`BatchOrchestrator`] from its four external collaborators
/// (§6: SummarizerClient, Merger, NotificationSink, PartialResultRepository)
/// plus configuration and an optional clock override for tests.
pub struct BatchOrchestratorBuilder {
    config: OrchestratorConfig,
    clock: Arc<dyn Clock>,
    client: Option<Arc<dyn SummarizerClient>>,
    merger: Option<Arc<dyn Merger>>,
    notifications: Option<Arc<dyn NotificationSink>>,
    repository: Option<Arc<dyn PartialResultRepository>>,
}

impl Default for BatchOrchestratorBuilder {
    fn default() -> Self {
        Self {
            config: OrchestratorConfig::default(),
            clock: Arc::new(SystemClock),
            client: None,
            merger: None,
            notifications: None,
            repository: None,
        }
    }
}

impl BatchOrchestratorBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_client(mut self, client: Arc<dyn SummarizerClient>) -> Self {
        self.client = Some(client);
        self
    }

    #[must_use]
    pub fn with_merger(mut self, merger: Arc<dyn Merger>) -> Self {
        self.merger = Some(merger);
        self
    }

    #[must_use]
    pub fn with_notifications(mut self, notifications: Arc<dyn NotificationSink>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    #[must_use]
    pub fn with_repository(mut self, repository: Arc<dyn PartialResultRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Fails if a required collaborator was never supplied; the core has
    /// no stdlib-backed stand-ins for an LLM client, merge strategy,
    /// notification transport, or persistence layer.
    pub fn build(self) -> Result<Arc<BatchOrchestrator>, &'static str> {
        let client = self.client.ok_or("BatchOrchestratorBuilder: SummarizerClient not set")?;
        let merger = self.merger.ok_or("BatchOrchestratorBuilder: Merger not set")?;
        let notifications = self
            .notifications
            .ok_or("BatchOrchestratorBuilder: NotificationSink not set")?;
        let repository = self
            .repository
            .ok_or("BatchOrchestratorBuilder: PartialResultRepository not set")?;

        let config = Arc::new(self.config);
        let clock = self.clock;

        let concurrency = Arc::new(ConcurrencyController::new(config.concurrency.clone()));
        let progress_calculator = Arc::new(ProgressCalculator::new(config.progress.clone()));
        let cancellation = Arc::new(CancellationService::new(config.cancellation.clone(), Arc::clone(&clock)));
        let partial_results = Arc::new(PartialResultHandler::new(
            config.partial_result.clone(),
            Arc::clone(&merger),
            Arc::clone(&repository),
        ));
        let recovery = Arc::new(Recovery::new(Arc::clone(&clock), repository, Arc::clone(&notifications)));

        Ok(BatchOrchestrator::new(
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
        ))
    }
}
