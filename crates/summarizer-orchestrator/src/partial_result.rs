//! # Partial-Result Handler (§4.7)

use std::sync::Arc;

use chrono::Utc;
use summarizer_shared::config::PartialResultConfig;
use summarizer_shared::domain::{
    CoverageReport, OverallQuality, PartialResult, PartialResultStatus, QualityEvaluation,
    RecommendedAction, SegmentStatus, SegmentTask, SegmentTaskStatus,
};
use summarizer_shared::errors::{SummarizerError, SummarizerResult};
use summarizer_shared::traits::{MergePreferences, MergeStrategy, Merger, PartialResultRepository};
use uuid::Uuid;

#[derive(Debug)]
pub struct PartialResultHandler {
    config: PartialResultConfig,
    merger: Arc<dyn Merger>,
    repository: Arc<dyn PartialResultRepository>,
}

impl PartialResultHandler {
    #[must_use]
    pub fn new(
        config: PartialResultConfig,
        merger: Arc<dyn Merger>,
        repository: Arc<dyn PartialResultRepository>,
    ) -> Self {
        Self {
            config,
            merger,
            repository,
        }
    }

    /// Filters to Completed tasks with a non-empty summary, sorted by index (§4.7).
    #[must_use]
    pub fn collect_completed(tasks: &[SegmentTask]) -> Vec<&SegmentTask> {
        let mut completed: Vec<&SegmentTask> = tasks
            .iter()
            .filter(|t| t.status == SegmentTaskStatus::Completed && t.summary.as_deref().is_some_and(|s| !s.is_empty()))
            .collect();
        completed.sort_by_key(|t| t.index);
        completed
    }

    pub async fn evaluate(&self, completed: &[&SegmentTask], total: usize) -> QualityEvaluation {
        let completeness = if total == 0 {
            0.0
        } else {
            completed.len() as f64 / total as f64
        };

        let coverage = coverage_report(completed, total);
        let coherence = self.coherence(completed).await;

        let missing_topics = missing_topics(completed, total);
        let score = 0.7 * completeness + 0.3 * coherence;
        let overall_quality = OverallQuality::from_score(score);
        let recommended_action = RecommendedAction::from(overall_quality);
        let warnings = warnings(completeness, coherence, &coverage, total);

        QualityEvaluation {
            completeness,
            coverage,
            coherence,
            missing_topics,
            overall_quality,
            recommended_action,
            warnings,
        }
    }

    async fn coherence(&self, completed: &[&SegmentTask]) -> f64 {
        if completed.len() < 2 {
            return if completed.is_empty() { 0.0 } else { 1.0 };
        }
        let owned: Vec<SegmentTask> = completed.iter().map(|t| (*t).clone()).collect();
        match self
            .merger
            .preview(&owned, &MergeStrategy::balanced(), None)
            .await
        {
            Ok(preview) => preview.estimated_quality.clamp(0.0, 1.0),
            Err(_) => adjacency_fraction(completed),
        }
    }

    /// Runs `evaluate`, merges via the Balanced strategy (falling back to
    /// ordered concatenation with gap markers on merger failure), and
    /// attaches a sample of the original text (§4.7).
    pub async fn process_partial_result(
        &self,
        batch_id: Uuid,
        owner: impl Into<String>,
        completed: &[&SegmentTask],
        total: usize,
    ) -> PartialResult {
        let owner = owner.into();
        let quality = self.evaluate(completed, total).await;

        let owned: Vec<SegmentTask> = completed.iter().map(|t| (*t).clone()).collect();
        let partial_summary = match self
            .merger
            .merge(&owned, &MergeStrategy::balanced(), None)
            .await
        {
            Ok(output) => output.summary,
            Err(_) => concatenate_with_gap_markers(completed, total),
        };

        let completion_percentage = if total == 0 {
            0.0
        } else {
            100.0 * completed.len() as f64 / total as f64
        };

        PartialResult {
            id: Uuid::now_v7(),
            batch_id,
            owner,
            completed_segments: completed.iter().map(|t| SegmentStatus::from(*t)).collect(),
            total_segments: total,
            completion_percentage,
            partial_summary,
            original_text_sample: original_text_sample(completed),
            quality,
            cancelled_at: Utc::now(),
            status: PartialResultStatus::PendingUserDecision,
            user_comment: None,
            accepted_at: None,
        }
    }

    pub async fn save(&self, result: PartialResult) -> SummarizerResult<PartialResult> {
        self.repository.save(result).await
    }

    pub async fn get(&self, id: Uuid) -> SummarizerResult<Option<PartialResult>> {
        self.repository.get(id).await
    }

    /// Mutations require the caller's `owner` to match the stored record.
    pub async fn update_status(
        &self,
        id: Uuid,
        owner: &str,
        status: PartialResultStatus,
    ) -> SummarizerResult<()> {
        let Some(existing) = self.repository.get(id).await? else {
            return Err(SummarizerError::validation("partial result not found").with_code("NOT_FOUND"));
        };
        if existing.owner != owner {
            return Err(SummarizerError::authorization("owner mismatch").with_owner(owner));
        }
        self.repository.update_status(id, owner, status).await
    }

    pub async fn list_by_owner(
        &self,
        owner: &str,
        page: usize,
        size: usize,
    ) -> SummarizerResult<Vec<PartialResult>> {
        self.repository.list_by_owner(owner, page, size).await
    }

    /// Transitions PendingUserDecision records older than the configured
    /// horizon to Expired.
    pub async fn cleanup_expired(&self) -> SummarizerResult<usize> {
        self.repository.cleanup_expired(self.config.expiry()).await
    }

    /// True iff OverallQuality ≥ Acceptable and completeness ≥ 0.3 (§4.7).
    pub async fn can_continue_from(&self, partial_id: Uuid, owner: &str) -> SummarizerResult<bool> {
        let Some(result) = self.repository.get(partial_id).await? else {
            return Ok(false);
        };
        if result.owner != owner {
            return Err(SummarizerError::authorization("owner mismatch").with_owner(owner));
        }
        Ok(result.can_continue_from())
    }
}

fn coverage_report(completed: &[&SegmentTask], total: usize) -> CoverageReport {
    if total == 0 {
        return CoverageReport::default();
    }
    let third = (total as f64 / 3.0).ceil() as usize;
    let third = third.max(1);

    let in_range = |idx: usize, lo: usize, hi: usize| idx >= lo && idx < hi;
    let beginning = completed.iter().filter(|t| in_range(t.index, 0, third)).count();
    let middle = completed
        .iter()
        .filter(|t| in_range(t.index, third, (2 * third).min(total)))
        .count();
    let end = completed
        .iter()
        .filter(|t| t.index >= (2 * third).min(total))
        .count();

    let beginning_span = third.min(total);
    let middle_span = ((2 * third).min(total)).saturating_sub(third);
    let end_span = total.saturating_sub((2 * third).min(total));

    let mut indices: Vec<usize> = completed.iter().map(|t| t.index).collect();
    indices.sort_unstable();
    let (max_continuous_length, coverage_gaps) = continuity(&indices);

    CoverageReport {
        beginning_coverage: ratio(beginning, beginning_span),
        middle_coverage: ratio(middle, middle_span),
        end_coverage: ratio(end, end_span),
        max_continuous_length,
        coverage_gaps,
    }
}

fn ratio(count: usize, span: usize) -> f64 {
    if span == 0 {
        0.0
    } else {
        count as f64 / span as f64
    }
}

fn continuity(sorted_indices: &[usize]) -> (usize, usize) {
    if sorted_indices.is_empty() {
        return (0, 0);
    }
    let mut max_run = 1usize;
    let mut current_run = 1usize;
    let mut gaps = 0usize;
    for window in sorted_indices.windows(2) {
        if window[1] == window[0] + 1 {
            current_run += 1;
            max_run = max_run.max(current_run);
        } else {
            gaps += 1;
            current_run = 1;
        }
    }
    (max_run, gaps)
}

fn adjacency_fraction(completed: &[&SegmentTask]) -> f64 {
    if completed.len() < 2 {
        return 1.0;
    }
    let mut indices: Vec<usize> = completed.iter().map(|t| t.index).collect();
    indices.sort_unstable();
    let consecutive = indices.windows(2).filter(|w| w[1] == w[0] + 1).count();
    consecutive as f64 / (indices.len() - 1) as f64
}

fn missing_topics(completed: &[&SegmentTask], total: usize) -> Vec<String> {
    if total == 0 {
        return Vec::new();
    }
    let mut indices: Vec<usize> = completed.iter().map(|t| t.index).collect();
    indices.sort_unstable();
    let mut topics = Vec::new();

    if indices.first().map(|&i| i > 0).unwrap_or(true) {
        topics.push("missing content from the beginning of the document".to_string());
    }
    if indices.last().map(|&i| i < total - 1).unwrap_or(true) {
        topics.push("missing content from the end of the document".to_string());
    }
    for window in indices.windows(2) {
        if window[1] > window[0] + 1 {
            topics.push(format!(
                "missing segments between index {} and {}",
                window[0], window[1]
            ));
        }
    }
    topics
}

fn warnings(completeness: f64, coherence: f64, coverage: &CoverageReport, total: usize) -> Vec<String> {
    let mut warnings = Vec::new();
    if completeness < 0.3 {
        warnings.push("completeness is very low".to_string());
    }
    if coherence < 0.5 {
        warnings.push("coherence is low; segments may not connect well".to_string());
    }
    if coverage.coverage_gaps > 0 {
        warnings.push(format!("{} coverage gap(s) detected", coverage.coverage_gaps));
    }
    if total > 0 && coverage.beginning_coverage < 0.5 {
        warnings.push("beginning of the document is underrepresented".to_string());
    }
    if total > 0 && coverage.end_coverage < 0.5 {
        warnings.push("end of the document is underrepresented".to_string());
    }
    warnings
}

/// First 200 chars of up to three completed segments' original content, in
/// index order (§4.7).
fn original_text_sample(completed: &[&SegmentTask]) -> Vec<String> {
    completed
        .iter()
        .take(3)
        .map(|t| t.segment.content.chars().take(200).collect())
        .collect()
}

fn concatenate_with_gap_markers(completed: &[&SegmentTask], total: usize) -> String {
    let mut indices: Vec<usize> = completed.iter().map(|t| t.index).collect();
    indices.sort_unstable();
    let mut out = String::new();
    let mut last = None;
    for task in completed.iter() {
        if let Some(prev) = last {
            if task.index > prev + 1 {
                out.push_str("\n[...gap...]\n");
            }
        }
        if let Some(summary) = &task.summary {
            out.push_str(summary);
            out.push('\n');
        }
        last = Some(task.index);
    }
    if indices.last().map(|&i| i < total.saturating_sub(1)).unwrap_or(false) {
        out.push_str("[...gap...]\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use summarizer_shared::domain::{Segment, SegmentKind};
    use summarizer_shared::errors::SummarizerResult as Result_;
    use summarizer_shared::traits::{MergeOutput, PreviewOutput};

    fn completed_task(index: usize, summary: &str) -> SegmentTask {
        let mut t = SegmentTask::new(index, Segment::new(format!("seg {index}"), 0, SegmentKind::Sentence));
        t.status = SegmentTaskStatus::Completed;
        t.summary = Some(summary.to_string());
        t
    }

    #[derive(Debug)]
    struct StubMerger {
        fail: bool,
    }

    #[async_trait]
    impl Merger for StubMerger {
        async fn merge(
            &self,
            completed: &[SegmentTask],
            _strategy: &MergeStrategy,
            _preferences: Option<&MergePreferences>,
        ) -> Result_<MergeOutput> {
            if self.fail {
                return Err(SummarizerError::processing("merge failed"));
            }
            Ok(MergeOutput {
                summary: completed.iter().filter_map(|t| t.summary.clone()).collect::<Vec<_>>().join(" "),
                quality: 0.9,
                processing_time_ms: 5,
            })
        }

        async fn preview(
            &self,
            _completed: &[SegmentTask],
            _strategy: &MergeStrategy,
            _preferences: Option<&MergePreferences>,
        ) -> Result_<PreviewOutput> {
            if self.fail {
                return Err(SummarizerError::processing("preview failed"));
            }
            Ok(PreviewOutput {
                summary: "preview".into(),
                estimated_quality: 0.8,
                estimated_duration_ms: 1,
            })
        }
    }

    #[derive(Debug, Default)]
    struct StubRepository;

    #[async_trait]
    impl PartialResultRepository for StubRepository {
        async fn save(&self, result: PartialResult) -> Result_<PartialResult> {
            Ok(result)
        }
        async fn get(&self, _id: Uuid) -> Result_<Option<PartialResult>> {
            Ok(None)
        }
        async fn update_status(&self, _id: Uuid, _owner: &str, _status: PartialResultStatus) -> Result_<()> {
            Ok(())
        }
        async fn list_by_owner(&self, _owner: &str, _page: usize, _size: usize) -> Result_<Vec<PartialResult>> {
            Ok(vec![])
        }
        async fn list_by_status_and_cutoff(
            &self,
            _status: PartialResultStatus,
            _cutoff: chrono::DateTime<chrono::Utc>,
        ) -> Result_<Vec<PartialResult>> {
            Ok(vec![])
        }
        async fn cleanup_expired(&self, _horizon: chrono::Duration) -> Result_<usize> {
            Ok(0)
        }
    }

    fn handler(fail_merger: bool) -> PartialResultHandler {
        PartialResultHandler::new(
            PartialResultConfig::default(),
            Arc::new(StubMerger { fail: fail_merger }),
            Arc::new(StubRepository),
        )
    }

    #[test]
    fn collect_completed_filters_and_sorts() {
        let tasks = vec![
            completed_task(2, "c"),
            SegmentTask::new(1, Segment::new("x", 0, SegmentKind::Sentence)),
            completed_task(0, "a"),
        ];
        let collected = PartialResultHandler::collect_completed(&tasks);
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].index, 0);
        assert_eq!(collected[1].index, 2);
    }

    #[tokio::test]
    async fn evaluate_all_completed_is_perfect_completeness() {
        let tasks = vec![completed_task(0, "a"), completed_task(1, "b")];
        let refs: Vec<&SegmentTask> = tasks.iter().collect();
        let evaluation = handler(false).evaluate(&refs, 2).await;
        assert_eq!(evaluation.completeness, 1.0);
        assert_eq!(evaluation.overall_quality, OverallQuality::Excellent);
    }

    #[tokio::test]
    async fn evaluate_zero_completed_is_unusable() {
        let tasks: Vec<SegmentTask> = vec![];
        let refs: Vec<&SegmentTask> = tasks.iter().collect();
        let evaluation = handler(false).evaluate(&refs, 5).await;
        assert_eq!(evaluation.completeness, 0.0);
        assert_eq!(evaluation.overall_quality, OverallQuality::Unusable);
    }

    #[tokio::test]
    async fn process_partial_result_falls_back_to_concatenation_on_merge_failure() {
        let tasks = vec![completed_task(0, "a"), completed_task(2, "c")];
        let refs: Vec<&SegmentTask> = tasks.iter().collect();
        let result = handler(true)
            .process_partial_result(Uuid::now_v7(), "alice", &refs, 3)
            .await;
        assert!(result.partial_summary.contains("a"));
        assert!(result.partial_summary.contains("gap"));
        assert_eq!(result.status, PartialResultStatus::PendingUserDecision);
    }

    #[tokio::test]
    async fn process_partial_result_completion_percentage_matches_invariant() {
        let tasks = vec![completed_task(0, "a"), completed_task(1, "b")];
        let refs: Vec<&SegmentTask> = tasks.iter().collect();
        let result = handler(false)
            .process_partial_result(Uuid::now_v7(), "alice", &refs, 4)
            .await;
        assert_eq!(result.completion_percentage, 50.0);
    }

    #[tokio::test]
    async fn can_continue_from_unknown_id_is_false() {
        let ok = handler(false).can_continue_from(Uuid::now_v7(), "alice").await.unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn process_partial_result_samples_up_to_three_segments_truncated_to_200_chars() {
        let long_content = "x".repeat(300);
        let mut tasks = vec![
            completed_task(0, "s0"),
            completed_task(1, "s1"),
            completed_task(2, "s2"),
            completed_task(3, "s3"),
        ];
        tasks[0].segment.content = long_content.clone();
        let refs: Vec<&SegmentTask> = tasks.iter().collect();

        let result = handler(false)
            .process_partial_result(Uuid::now_v7(), "alice", &refs, 4)
            .await;

        assert_eq!(result.original_text_sample.len(), 3);
        assert_eq!(result.original_text_sample[0].chars().count(), 200);
        assert!(long_content.starts_with(&result.original_text_sample[0]));
    }
}
