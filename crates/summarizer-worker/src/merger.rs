//! # Balanced Merger (§2, §4.7)
//!
//! Default `Merger`: ordered concatenation with light normalization,
//! standing in for whatever "real" merge algorithm (LLM-driven rewrite,
//! extractive re-ranking, ...) a deployment would plug in instead. When a
//! character budget is given it truncates every segment's contribution
//! proportionally rather than just cutting the tail, so the end of the
//! document isn't silently dropped.

use async_trait::async_trait;
use summarizer_shared::domain::SegmentTask;
use summarizer_shared::errors::SummarizerResult;
use summarizer_shared::traits::{MergeOutput, MergePreferences, MergeStrategy, Merger, PreviewOutput};

#[derive(Debug, Default)]
pub struct BalancedMerger;

impl BalancedMerger {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Merger for BalancedMerger {
    async fn merge(
        &self,
        completed: &[SegmentTask],
        _strategy: &MergeStrategy,
        preferences: Option<&MergePreferences>,
    ) -> SummarizerResult<MergeOutput> {
        let started = std::time::Instant::now();
        let ordered = ordered_summaries(completed);
        let budget = preferences.and_then(|p| p.max_summary_chars);
        let summary = join_within_budget(&ordered, budget);

        Ok(MergeOutput {
            quality: adjacency_quality(completed),
            summary,
            processing_time_ms: started.elapsed().as_millis() as i64,
        })
    }

    async fn preview(
        &self,
        completed: &[SegmentTask],
        _strategy: &MergeStrategy,
        preferences: Option<&MergePreferences>,
    ) -> SummarizerResult<PreviewOutput> {
        let ordered = ordered_summaries(completed);
        let budget = preferences.and_then(|p| p.max_summary_chars);
        let summary = join_within_budget(&ordered, budget);

        Ok(PreviewOutput {
            estimated_quality: adjacency_quality(completed),
            estimated_duration_ms: (ordered.len() as i64) * 2,
            summary,
        })
    }
}

fn ordered_summaries(completed: &[SegmentTask]) -> Vec<(usize, String)> {
    let mut ordered: Vec<&SegmentTask> = completed.iter().collect();
    ordered.sort_by_key(|t| t.index);
    ordered
        .into_iter()
        .filter_map(|t| t.summary.as_deref().map(|s| (t.index, normalize(s))))
        .collect()
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Concatenates in index order, inserting a gap marker wherever the
/// source indices are not consecutive. When `budget` is set and the full
/// join would exceed it, every segment is truncated to the same
/// proportion of its own length so no single segment dominates.
fn join_within_budget(ordered: &[(usize, String)], budget: Option<usize>) -> String {
    let total_chars: usize = ordered.iter().map(|(_, s)| s.chars().count()).sum();

    let bodies: Vec<String> = match budget {
        Some(budget) if total_chars > budget && !ordered.is_empty() => {
            let ratio = budget as f64 / total_chars as f64;
            ordered
                .iter()
                .map(|(_, s)| truncate_chars(s, ((s.chars().count() as f64) * ratio).floor() as usize))
                .collect()
        }
        _ => ordered.iter().map(|(_, s)| s.clone()).collect(),
    };

    let mut out = String::new();
    let mut last_index = None;
    for ((index, _), body) in ordered.iter().zip(bodies.iter()) {
        if let Some(prev) = last_index {
            if *index > prev + 1 {
                out.push_str("\n[...]\n");
            }
        }
        out.push_str(body);
        out.push('\n');
        last_index = Some(*index);
    }
    out.trim_end().to_string()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Fraction of adjacent completed-index pairs, used as a cheap proxy for
/// how well the segments hang together (§4.7 calls the real thing
/// "coherence"; a concatenation merger has no semantic signal beyond
/// ordering, so this is what it can honestly report).
fn adjacency_quality(completed: &[SegmentTask]) -> f64 {
    if completed.len() < 2 {
        return if completed.is_empty() { 0.0 } else { 1.0 };
    }
    let mut indices: Vec<usize> = completed.iter().map(|t| t.index).collect();
    indices.sort_unstable();
    let consecutive = indices.windows(2).filter(|w| w[1] == w[0] + 1).count();
    consecutive as f64 / (indices.len() - 1) as f64
}
