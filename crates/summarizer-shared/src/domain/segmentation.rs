//! Segmentation request/response types (§4.2).

use super::segment::Segment;
use serde::{Deserialize, Serialize};

/// Input to `Segmenter::segment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationRequest {
    pub text: String,
    pub generate_titles: bool,
}

impl SegmentationRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            generate_titles: false,
        }
    }
}

/// Three sub-scores (0-100) and their mean, used to accept/reject a
/// segmentation and to decide whether the LLM fallback should be tried.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentationQuality {
    pub semantic_integrity: f64,
    pub paragraph_integrity: f64,
    pub length_balance: f64,
}

impl SegmentationQuality {
    pub fn overall(&self) -> f64 {
        (self.semantic_integrity + self.paragraph_integrity + self.length_balance) / 3.0
    }

    pub fn acceptable(&self) -> bool {
        self.overall() >= 70.0
    }
}

/// Output of `Segmenter::segment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationResult {
    pub segments: Vec<Segment>,
    pub quality: SegmentationQuality,
    pub used_llm_fallback: bool,
}
