//! Recovery record and health-check types (§3, §4.9).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryStepStatus {
    InProgress,
    Completed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryStep {
    pub name: String,
    pub status: RecoveryStepStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub message: Option<String>,
}

impl RecoveryStep {
    pub fn started(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            status: RecoveryStepStatus::InProgress,
            started_at: now,
            finished_at: None,
            message: None,
        }
    }

    pub fn finish(&mut self, status: RecoveryStepStatus, now: DateTime<Utc>, message: Option<String>) {
        self.status = status;
        self.finished_at = Some(now);
        self.message = message;
    }
}

/// Health status of one system component, as polled by `Recovery::health_check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentHealthStatus {
    Unknown,
    Healthy,
    Warning,
    Unhealthy,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub component: String,
    pub status: ComponentHealthStatus,
    pub metrics: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    pub components: Vec<ComponentHealth>,
}

impl SystemHealth {
    /// Overall health is the worst of all component statuses.
    #[must_use]
    pub fn overall(&self) -> ComponentHealthStatus {
        self.components
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(ComponentHealthStatus::Unknown)
    }
}

/// Audit trail of one recovery run against a batch (§4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryRecord {
    pub batch_id: Uuid,
    pub reason: String,
    pub steps: Vec<RecoveryStep>,
    pub post_recovery_health: Option<SystemHealth>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RecoveryRecord {
    pub fn started(batch_id: Uuid, reason: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            batch_id,
            reason: reason.into(),
            steps: Vec::new(),
            post_recovery_health: None,
            started_at: now,
            finished_at: None,
        }
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.steps
            .iter()
            .all(|s| !matches!(s.status, RecoveryStepStatus::Failed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overall_health_is_worst_of_components() {
        let health = SystemHealth {
            components: vec![
                ComponentHealth {
                    component: "db".into(),
                    status: ComponentHealthStatus::Healthy,
                    metrics: serde_json::json!({}),
                },
                ComponentHealth {
                    component: "disk".into(),
                    status: ComponentHealthStatus::Warning,
                    metrics: serde_json::json!({}),
                },
            ],
        };
        assert_eq!(health.overall(), ComponentHealthStatus::Warning);
    }

    #[test]
    fn empty_health_is_unknown() {
        let health = SystemHealth { components: vec![] };
        assert_eq!(health.overall(), ComponentHealthStatus::Unknown);
    }

    #[test]
    fn succeeded_false_if_any_step_failed() {
        let mut record = RecoveryRecord::started(Uuid::now_v7(), "stale", Utc::now());
        let mut step = RecoveryStep::started("cleanup", Utc::now());
        step.finish(RecoveryStepStatus::Failed, Utc::now(), Some("boom".into()));
        record.steps.push(step);
        assert!(!record.succeeded());
    }
}
