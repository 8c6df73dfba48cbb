//! # Segmentation Configuration
//!
//! Configuration for the Segmenter (§4.2, §6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Upper bound on characters per segment.
    pub max_segment_length: usize,
    /// Threshold above which `Segmenter::needs_segmentation` returns true.
    pub trigger_length: usize,
    /// Characters that close a sentence.
    pub sentence_end_markers: Vec<char>,
    /// Whether paragraph boundaries are sticky.
    pub preserve_paragraphs: bool,
    /// Allow the LLM re-segmentation fallback when the punctuation result
    /// scores below the acceptability threshold.
    pub llm_segmentation_enabled: bool,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            max_segment_length: 2000,
            trigger_length: 4000,
            sentence_end_markers: vec!['.', '!', '?'],
            preserve_paragraphs: true,
            llm_segmentation_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_defaults() {
        let config = SegmentationConfig::default();
        assert_eq!(config.sentence_end_markers, vec!['.', '!', '?']);
        assert!(config.preserve_paragraphs);
        assert!(config.llm_segmentation_enabled);
    }
}
