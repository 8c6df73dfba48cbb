//! # In-Memory Partial-Result Repository (§2, §6)
//!
//! A `dashmap`-backed `PartialResultRepository`. Ownership checks happen in
//! `PartialResultHandler`; this store just persists rows keyed by id and
//! answers the owner/status/cutoff queries it's asked for.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use summarizer_shared::domain::{PartialResult, PartialResultStatus};
use summarizer_shared::errors::SummarizerResult;
use summarizer_shared::traits::PartialResultRepository;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct InMemoryPartialResultRepository {
    rows: DashMap<Uuid, PartialResult>,
}

impl InMemoryPartialResultRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PartialResultRepository for InMemoryPartialResultRepository {
    async fn save(&self, result: PartialResult) -> SummarizerResult<PartialResult> {
        self.rows.insert(result.id, result.clone());
        Ok(result)
    }

    async fn get(&self, id: Uuid) -> SummarizerResult<Option<PartialResult>> {
        Ok(self.rows.get(&id).map(|row| row.clone()))
    }

    async fn update_status(&self, id: Uuid, owner: &str, status: PartialResultStatus) -> SummarizerResult<()> {
        if let Some(mut row) = self.rows.get_mut(&id) {
            if row.owner == owner {
                row.status = status;
                if status == PartialResultStatus::Accepted {
                    row.accepted_at = Some(Utc::now());
                }
            }
        }
        Ok(())
    }

    async fn list_by_owner(&self, owner: &str, page: usize, size: usize) -> SummarizerResult<Vec<PartialResult>> {
        let mut rows: Vec<PartialResult> = self
            .rows
            .iter()
            .filter(|entry| entry.owner == owner)
            .map(|entry| entry.clone())
            .collect();
        rows.sort_by(|a, b| b.cancelled_at.cmp(&a.cancelled_at));
        let start = page.saturating_mul(size);
        Ok(rows.into_iter().skip(start).take(size).collect())
    }

    async fn list_by_status_and_cutoff(
        &self,
        status: PartialResultStatus,
        cutoff: DateTime<Utc>,
    ) -> SummarizerResult<Vec<PartialResult>> {
        Ok(self
            .rows
            .iter()
            .filter(|entry| entry.status == status && entry.cancelled_at <= cutoff)
            .map(|entry| entry.clone())
            .collect())
    }

    async fn cleanup_expired(&self, horizon: chrono::Duration) -> SummarizerResult<usize> {
        let cutoff = Utc::now() - horizon;
        let mut expired = 0;
        for mut row in self.rows.iter_mut() {
            if row.status == PartialResultStatus::PendingUserDecision && row.cancelled_at <= cutoff {
                row.status = PartialResultStatus::Expired;
                expired += 1;
            }
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use summarizer_shared::domain::{CoverageReport, OverallQuality, QualityEvaluation, RecommendedAction};

    fn row(owner: &str, cancelled_at: DateTime<Utc>, status: PartialResultStatus) -> PartialResult {
        PartialResult {
            id: Uuid::now_v7(),
            batch_id: Uuid::now_v7(),
            owner: owner.to_string(),
            completed_segments: vec![],
            total_segments: 4,
            completion_percentage: 50.0,
            partial_summary: "partial".into(),
            original_text_sample: vec![],
            quality: QualityEvaluation {
                completeness: 0.5,
                coverage: CoverageReport::default(),
                coherence: 0.5,
                missing_topics: vec![],
                overall_quality: OverallQuality::Acceptable,
                recommended_action: RecommendedAction::ReviewRequired,
                warnings: vec![],
            },
            cancelled_at,
            status,
            user_comment: None,
            accepted_at: None,
        }
    }

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let repo = InMemoryPartialResultRepository::new();
        let saved = repo.save(row("alice", Utc::now(), PartialResultStatus::PendingUserDecision)).await.unwrap();
        let fetched = repo.get(saved.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, saved.id);
        assert_eq!(fetched.owner, "alice");
    }

    #[tokio::test]
    async fn update_status_is_noop_for_wrong_owner() {
        let repo = InMemoryPartialResultRepository::new();
        let saved = repo.save(row("alice", Utc::now(), PartialResultStatus::PendingUserDecision)).await.unwrap();
        repo.update_status(saved.id, "mallory", PartialResultStatus::Accepted).await.unwrap();
        let fetched = repo.get(saved.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, PartialResultStatus::PendingUserDecision);
    }

    #[tokio::test]
    async fn update_status_by_owner_stamps_accepted_at() {
        let repo = InMemoryPartialResultRepository::new();
        let saved = repo.save(row("alice", Utc::now(), PartialResultStatus::PendingUserDecision)).await.unwrap();
        repo.update_status(saved.id, "alice", PartialResultStatus::Accepted).await.unwrap();
        let fetched = repo.get(saved.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, PartialResultStatus::Accepted);
        assert!(fetched.accepted_at.is_some());
    }

    #[tokio::test]
    async fn list_by_owner_paginates_newest_first() {
        let repo = InMemoryPartialResultRepository::new();
        let now = Utc::now();
        repo.save(row("alice", now - chrono::Duration::minutes(2), PartialResultStatus::PendingUserDecision))
            .await
            .unwrap();
        repo.save(row("alice", now, PartialResultStatus::PendingUserDecision)).await.unwrap();
        repo.save(row("bob", now, PartialResultStatus::PendingUserDecision)).await.unwrap();

        let page = repo.list_by_owner("alice", 0, 10).await.unwrap();
        assert_eq!(page.len(), 2);
        assert!(page[0].cancelled_at >= page[1].cancelled_at);
    }

    #[tokio::test]
    async fn cleanup_expired_transitions_only_stale_pending_rows() {
        let repo = InMemoryPartialResultRepository::new();
        let stale = row(
            "alice",
            Utc::now() - chrono::Duration::hours(48),
            PartialResultStatus::PendingUserDecision,
        );
        let fresh = row("alice", Utc::now(), PartialResultStatus::PendingUserDecision);
        repo.save(stale.clone()).await.unwrap();
        repo.save(fresh.clone()).await.unwrap();

        let expired = repo.cleanup_expired(chrono::Duration::hours(24)).await.unwrap();
        assert_eq!(expired, 1);
        assert_eq!(repo.get(stale.id).await.unwrap().unwrap().status, PartialResultStatus::Expired);
        assert_eq!(repo.get(fresh.id).await.unwrap().unwrap().status, PartialResultStatus::PendingUserDecision);
    }

    #[tokio::test]
    async fn list_by_status_and_cutoff_filters_both_fields() {
        let repo = InMemoryPartialResultRepository::new();
        let now = Utc::now();
        let old_processing = row("alice", now - chrono::Duration::hours(1), PartialResultStatus::Processing);
        let recent_processing = row("alice", now, PartialResultStatus::Processing);
        repo.save(old_processing.clone()).await.unwrap();
        repo.save(recent_processing).await.unwrap();

        let cutoff = now - chrono::Duration::minutes(30);
        let stale = repo.list_by_status_and_cutoff(PartialResultStatus::Processing, cutoff).await.unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, old_processing.id);
    }
}
