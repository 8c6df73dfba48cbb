//! # Cancellation Service (§4.8)
//!
//! Owns the batch id → cancellation-state registry (§9: "break the cyclic
//! orchestrator ↔ cancellation-context ↔ task-list reference with an
//! index-based registry owned by the Cancellation Service"). The
//! orchestrator looks its batch up by id rather than holding a direct
//! reference into this service's state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use summarizer_shared::clock::Clock;
use summarizer_shared::config::CancellationConfig;
use summarizer_shared::domain::{CancellationOutcome, CancellationReason, CancellationRequest};
use tokio::sync::{watch, Mutex};
use tracing::info;
use uuid::Uuid;

/// Per-batch cancellation state. `requested`/`checkpoint`/`force` are
/// watch channels so the worker loop can await a change cheaply instead
/// of polling an `Arc<Mutex<bool>>`.
#[derive(Debug)]
struct Registration {
    requested_tx: watch::Sender<bool>,
    requested_rx: watch::Receiver<bool>,
    checkpoint_tx: watch::Sender<bool>,
    force_tx: watch::Sender<bool>,
    force_rx: watch::Receiver<bool>,
    request: Mutex<Option<CancellationRequest>>,
}

/// Handle the orchestrator's worker loop observes to check/report
/// cancellation and checkpoint state for one batch.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    batch_id: Uuid,
    requested_rx: watch::Receiver<bool>,
    checkpoint_tx: watch::Sender<bool>,
    force_rx: watch::Receiver<bool>,
}

impl CancellationToken {
    #[must_use]
    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    #[must_use]
    pub fn is_requested(&self) -> bool {
        *self.requested_rx.borrow()
    }

    #[must_use]
    pub fn is_forced(&self) -> bool {
        *self.force_rx.borrow()
    }

    pub fn set_checkpoint(&self, at_checkpoint: bool) {
        let _ = self.checkpoint_tx.send(at_checkpoint);
    }

    /// A receiver the worker loop can `select!` against to abort an
    /// in-flight LLM call the instant a force-cancel lands, rather than
    /// only checking `is_forced()` between attempts.
    #[must_use]
    pub fn force_receiver(&self) -> watch::Receiver<bool> {
        self.force_rx.clone()
    }
}

#[derive(Debug)]
pub struct CancellationService {
    config: CancellationConfig,
    clock: Arc<dyn Clock>,
    registrations: Mutex<HashMap<Uuid, Arc<Registration>>>,
}

impl CancellationService {
    #[must_use]
    pub fn new(config: CancellationConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            registrations: Mutex::new(HashMap::new()),
        }
    }

    pub async fn register(&self, batch_id: Uuid) -> CancellationToken {
        let (requested_tx, requested_rx) = watch::channel(false);
        let (checkpoint_tx, _checkpoint_rx) = watch::channel(false);
        let (force_tx, force_rx) = watch::channel(false);
        let registration = Arc::new(Registration {
            requested_tx,
            requested_rx: requested_rx.clone(),
            checkpoint_tx: checkpoint_tx.clone(),
            force_tx,
            force_rx: force_rx.clone(),
            request: Mutex::new(None),
        });
        self.registrations
            .lock()
            .await
            .insert(batch_id, Arc::clone(&registration));

        CancellationToken {
            batch_id,
            requested_rx,
            checkpoint_tx,
            force_rx,
        }
    }

    /// Atomic removal from the registry (§5: "registration and removal are atomic").
    pub async fn unregister(&self, batch_id: Uuid) {
        self.registrations.lock().await.remove(&batch_id);
    }

    pub async fn is_requested(&self, batch_id: Uuid) -> bool {
        self.registrations
            .lock()
            .await
            .get(&batch_id)
            .map(|r| *r.requested_rx.borrow())
            .unwrap_or(false)
    }

    pub async fn token(&self, batch_id: Uuid) -> Option<CancellationToken> {
        let registrations = self.registrations.lock().await;
        registrations.get(&batch_id).map(|r| CancellationToken {
            batch_id,
            requested_rx: r.requested_rx.clone(),
            checkpoint_tx: r.checkpoint_tx.clone(),
            force_rx: r.force_rx.clone(),
        })
    }

    pub async fn set_checkpoint(&self, batch_id: Uuid, at_checkpoint: bool) {
        if let Some(registration) = self.registrations.lock().await.get(&batch_id) {
            let _ = registration.checkpoint_tx.send(at_checkpoint);
        }
    }

    /// Implements §4.8's `Request`. `on_save_partial` is invoked only when
    /// `request.save_partial` is true and returns whether the save
    /// succeeded, so the caller (the Batch Orchestrator) stays the only
    /// place that knows how to assemble a partial result.
    pub async fn request<F, Fut>(
        &self,
        request: CancellationRequest,
        on_save_partial: F,
    ) -> CancellationOutcome
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        let registration = {
            let registrations = self.registrations.lock().await;
            registrations.get(&request.batch_id).cloned()
        };
        let Some(registration) = registration else {
            return CancellationOutcome::NotFound;
        };

        info!(
            batch_id = %request.batch_id,
            user = %request.user,
            reason = ?request.reason,
            force = request.force,
            "cancellation requested"
        );
        *registration.request.lock().await = Some(request.clone());
        let _ = registration.requested_tx.send(true);

        if request.force {
            let _ = registration.force_tx.send(true);
            return CancellationOutcome::Forced;
        }

        let start = self.clock.now();
        let deadline = self.config.graceful_timeout();
        let poll = self.config.checkpoint_poll_interval();
        loop {
            if *registration.checkpoint_tx.subscribe().borrow() {
                break;
            }
            let elapsed = self.clock.now() - start;
            if elapsed >= chrono_duration(deadline) {
                break;
            }
            self.clock.sleep(poll).await;
        }

        let partial_saved = if request.save_partial {
            on_save_partial().await
        } else {
            false
        };

        let graceful_duration_ms = (self.clock.now() - start).num_milliseconds();
        CancellationOutcome::Completed {
            graceful_duration_ms,
            partial_saved,
        }
    }

    #[must_use]
    pub fn config(&self) -> &CancellationConfig {
        &self.config
    }
}

fn chrono_duration(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero())
}

pub fn default_request(batch_id: Uuid, user: impl Into<String>) -> CancellationRequest {
    CancellationRequest::new(batch_id, user, CancellationReason::UserInitiated)
}
