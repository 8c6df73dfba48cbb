//! # Concurrency Controller (§4.3)
//!
//! Gates outbound LLM calls behind a [`tokio::sync::Semaphore`] whose
//! permit count is adjusted periodically from observed latency and
//! success-rate samples. Permits are never revoked out from under an
//! in-flight caller: shrinking capacity is done by acquiring-then-forgetting
//! one permit, so it only takes effect once a holder releases (§9: "no
//! active revocation — waited permits drain naturally").

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use summarizer_shared::config::ConcurrencyConfig;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

/// A held concurrency slot. Releases on drop (guaranteed on every exit
/// path, including cancellation) and decrements the active-request count.
#[derive(Debug)]
pub struct Permit {
    _inner: OwnedSemaphorePermit,
    active: Arc<AtomicUsize>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConcurrencyStatistics {
    pub current_permits: usize,
    pub active_requests: usize,
    pub avg_latency_ms: f64,
    pub success_rate: f64,
    pub sample_count: usize,
}

#[derive(Debug)]
struct Sample {
    latency: Duration,
    success: bool,
}

#[derive(Debug)]
pub struct ConcurrencyController {
    config: ConcurrencyConfig,
    semaphore: Arc<Semaphore>,
    current: AtomicUsize,
    active: Arc<AtomicUsize>,
    samples: Mutex<VecDeque<Sample>>,
}

impl ConcurrencyController {
    #[must_use]
    pub fn new(config: ConcurrencyConfig) -> Self {
        let initial = config.default_concurrent_limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(initial)),
            current: AtomicUsize::new(initial),
            active: Arc::new(AtomicUsize::new(0)),
            samples: Mutex::new(VecDeque::with_capacity(config.sample_window_cap)),
            config,
        }
    }

    /// Blocks until a permit is available (§4.3). `_batch_tag` is accepted
    /// for future per-batch fairness bookkeeping and logging correlation.
    pub async fn acquire(&self, _batch_tag: &str) -> Permit {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore is never closed");
        self.active.fetch_add(1, Ordering::SeqCst);
        Permit {
            _inner: permit,
            active: Arc::clone(&self.active),
        }
    }

    /// Appends to the bounded rolling window (cap `sample_window_cap`, §4.3).
    pub async fn record_outcome(&self, latency: Duration, success: bool) {
        let mut samples = self.samples.lock().await;
        if samples.len() >= self.config.sample_window_cap {
            samples.pop_front();
        }
        samples.push_back(Sample { latency, success });
    }

    /// Runs one adjustment decision (§4.3). Intended to be called on the
    /// configured `adjustment_interval`; exposed standalone so tests can
    /// drive it without waiting on a real timer.
    pub async fn adjust_once(&self) {
        let samples = self.samples.lock().await;
        if samples.len() < self.config.min_samples_for_adjustment {
            return;
        }

        let total_latency: Duration = samples.iter().map(|s| s.latency).sum();
        let avg_latency = total_latency / samples.len() as u32;
        let successes = samples.iter().filter(|s| s.success).count();
        let success_rate = successes as f64 / samples.len() as f64;
        drop(samples);

        let current = self.current.load(Ordering::SeqCst);
        if avg_latency < Duration::from_secs(3)
            && success_rate >= 0.95
            && current < self.config.max_concurrent_limit
        {
            self.semaphore.add_permits(1);
            self.current.fetch_add(1, Ordering::SeqCst);
        } else if current > 1 && (avg_latency > Duration::from_secs(10) || success_rate < 0.85) {
            self.current.fetch_sub(1, Ordering::SeqCst);
            let semaphore = Arc::clone(&self.semaphore);
            tokio::spawn(async move {
                if let Ok(permit) = semaphore.acquire_owned().await {
                    permit.forget();
                }
            });
        }
    }

    pub async fn statistics(&self) -> ConcurrencyStatistics {
        let samples = self.samples.lock().await;
        let avg_latency_ms = if samples.is_empty() {
            0.0
        } else {
            let total: Duration = samples.iter().map(|s| s.latency).sum();
            total.as_secs_f64() * 1000.0 / samples.len() as f64
        };
        let success_rate = if samples.is_empty() {
            1.0
        } else {
            samples.iter().filter(|s| s.success).count() as f64 / samples.len() as f64
        };
        ConcurrencyStatistics {
            current_permits: self.current.load(Ordering::SeqCst),
            active_requests: self.active.load(Ordering::SeqCst),
            avg_latency_ms,
            success_rate,
            sample_count: samples.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConcurrencyConfig {
        ConcurrencyConfig {
            default_concurrent_limit: 2,
            max_concurrent_limit: 8,
            adjustment_interval: Duration::from_secs(10),
            min_samples_for_adjustment: 10,
            sample_window_cap: 100,
        }
    }

    #[tokio::test]
    async fn starts_at_default_with_zero_active() {
        let controller = ConcurrencyController::new(config());
        let stats = controller.statistics().await;
        assert_eq!(stats.current_permits, 2);
        assert_eq!(stats.active_requests, 0);
    }

    #[tokio::test]
    async fn permit_release_decrements_active_on_drop() {
        let controller = ConcurrencyController::new(config());
        let permit = controller.acquire("batch-1").await;
        assert_eq!(controller.statistics().await.active_requests, 1);
        drop(permit);
        assert_eq!(controller.statistics().await.active_requests, 0);
    }

    #[tokio::test]
    async fn increases_permits_on_fast_reliable_samples() {
        let controller = ConcurrencyController::new(config());
        for _ in 0..10 {
            controller
                .record_outcome(Duration::from_millis(200), true)
                .await;
        }
        controller.adjust_once().await;
        assert_eq!(controller.statistics().await.current_permits, 3);
    }

    #[tokio::test]
    async fn never_exceeds_max_permits() {
        let controller = ConcurrencyController::new(ConcurrencyConfig {
            default_concurrent_limit: 8,
            max_concurrent_limit: 8,
            ..config()
        });
        for _ in 0..10 {
            controller
                .record_outcome(Duration::from_millis(200), true)
                .await;
        }
        controller.adjust_once().await;
        assert_eq!(controller.statistics().await.current_permits, 8);
    }

    #[tokio::test]
    async fn decreases_permits_on_slow_or_unreliable_samples() {
        let controller = ConcurrencyController::new(ConcurrencyConfig {
            default_concurrent_limit: 4,
            ..config()
        });
        for _ in 0..10 {
            controller
                .record_outcome(Duration::from_secs(11), false)
                .await;
        }
        controller.adjust_once().await;
        assert_eq!(controller.statistics().await.current_permits, 3);
    }

    #[tokio::test]
    async fn does_not_adjust_below_minimum_sample_count() {
        let controller = ConcurrencyController::new(config());
        for _ in 0..5 {
            controller
                .record_outcome(Duration::from_millis(100), true)
                .await;
        }
        controller.adjust_once().await;
        assert_eq!(controller.statistics().await.current_permits, 2);
    }
}
