//! # Clock Abstraction
//!
//! Per the re-architecture notes (§9: "inject a clock; tests must be able to
//! advance virtual time to exercise adjustment intervals and backoff"), all
//! components that reason about elapsed time or sleep go through `Clock`
//! rather than calling `chrono::Utc::now()` / `tokio::time::sleep` directly.
//! Production code uses `SystemClock`; tests can substitute a fake that
//! advances on demand.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Abstract source of wall-clock time and sleep, so tests can run backoff
/// and adjustment-interval logic without waiting in real time.
#[async_trait]
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by the system time and the Tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn system_clock_sleeps_and_advances_now() {
        let clock = SystemClock;
        let before = clock.now();
        clock.sleep(Duration::from_millis(5)).await;
        let after = clock.now();
        assert!(after >= before);
    }
}
