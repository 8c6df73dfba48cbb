//! # Segmenter (§4.2)
//!
//! Splits source text into ordered [`Segment`]s by punctuation and
//! paragraph boundaries, scores the result, and — when the score is
//! below the acceptability threshold and the LLM fallback is enabled —
//! asks a [`SummarizerClient`] to re-segment and adopts whichever
//! result scores higher.

use std::sync::Arc;

use summarizer_shared::config::SegmentationConfig;
use summarizer_shared::domain::{Segment, SegmentKind, SegmentationQuality, SegmentationResult};
use summarizer_shared::traits::SummarizerClient;

/// Sentinel the LLM re-segmentation prompt is instructed to emit between
/// chunks, so the response can be split back into segments.
const LLM_SEGMENT_DELIMITER: &str = "\n<<<SEGMENT>>>\n";

#[derive(Debug, Clone)]
pub struct SegmentationRequest {
    pub text: String,
    pub generate_titles: bool,
}

#[derive(Debug)]
pub struct Segmenter {
    config: SegmentationConfig,
    client: Option<Arc<dyn SummarizerClient>>,
}

impl Segmenter {
    #[must_use]
    pub fn new(config: SegmentationConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    /// Attach a Summarizer Client to enable the LLM re-segmentation fallback.
    #[must_use]
    pub fn with_client(mut self, client: Arc<dyn SummarizerClient>) -> Self {
        self.client = Some(client);
        self
    }

    #[must_use]
    pub fn needs_segmentation(&self, text: &str) -> bool {
        text.chars().count() > self.config.trigger_length
    }

    pub async fn segment(&self, request: &SegmentationRequest) -> SegmentationResult {
        let normalized = normalize(&request.text);
        let segments = self.punctuation_segments(&normalized);
        let quality = score(&segments, self.config.sentence_end_markers.as_slice());

        if quality.acceptable() || !self.config.llm_segmentation_enabled {
            return self.finish(segments, quality, false, request.generate_titles);
        }

        let Some(client) = self.client.as_ref() else {
            return self.finish(segments, quality, false, request.generate_titles);
        };

        match client.summarize(&llm_segmentation_prompt(&normalized)).await {
            Ok(response) => {
                let llm_segments = self.segments_from_llm_response(&response);
                if llm_segments.is_empty() {
                    return self.finish(segments, quality, false, request.generate_titles);
                }
                let llm_quality = score(&llm_segments, self.config.sentence_end_markers.as_slice());
                if llm_quality.overall() > quality.overall() {
                    self.finish(llm_segments, llm_quality, true, request.generate_titles)
                } else {
                    self.finish(segments, quality, false, request.generate_titles)
                }
            }
            Err(_) => self.finish(segments, quality, false, request.generate_titles),
        }
    }

    fn finish(
        &self,
        mut segments: Vec<Segment>,
        quality: SegmentationQuality,
        used_llm_fallback: bool,
        generate_titles: bool,
    ) -> SegmentationResult {
        if generate_titles {
            for (i, seg) in segments.iter_mut().enumerate() {
                if seg.title.is_none() {
                    seg.title = Some(derive_title(&seg.content, i));
                }
            }
        }
        SegmentationResult {
            segments,
            quality,
            used_llm_fallback,
        }
    }

    /// Step 1-3 of the algorithm: normalize is done by the caller; this
    /// handles paragraph splitting, the length cap, sentence packing, and
    /// the forced-split last resort.
    fn punctuation_segments(&self, normalized: &str) -> Vec<Segment> {
        let paragraphs: Vec<&str> = if self.config.preserve_paragraphs {
            normalized.split("\n\n").collect()
        } else {
            vec![normalized]
        };

        let mut segments = Vec::new();
        let mut byte_cursor = 0usize;
        for paragraph in paragraphs {
            if paragraph.is_empty() {
                byte_cursor += paragraph.len() + 2;
                continue;
            }
            if paragraph.chars().count() <= self.config.max_segment_length {
                segments.push(Segment::new(paragraph, byte_cursor, SegmentKind::Paragraph));
            } else {
                self.pack_sentences(paragraph, byte_cursor, &mut segments);
            }
            byte_cursor += paragraph.len() + 2;
        }
        segments
    }

    fn pack_sentences(&self, paragraph: &str, base_offset: usize, out: &mut Vec<Segment>) {
        let sentences = split_sentences(paragraph, &self.config.sentence_end_markers);
        let mut current = String::new();
        let mut current_offset = base_offset;
        let mut pending_offset = base_offset;

        let flush = |current: &mut String, offset: usize, out: &mut Vec<Segment>| {
            if !current.is_empty() {
                out.push(Segment::new(current.clone(), offset, SegmentKind::Sentence));
                current.clear();
            }
        };

        for sentence in sentences {
            if sentence.chars().count() > self.config.max_segment_length {
                flush(&mut current, pending_offset, out);
                self.force_split(sentence, current_offset, out);
                current_offset += sentence.len();
                pending_offset = current_offset;
                continue;
            }

            let would_be = current.chars().count() + sentence.chars().count();
            if !current.is_empty() && would_be > self.config.max_segment_length {
                flush(&mut current, pending_offset, out);
                pending_offset = current_offset;
            }
            current.push_str(sentence);
            current_offset += sentence.len();
        }
        flush(&mut current, pending_offset, out);
    }

    fn force_split(&self, text: &str, base_offset: usize, out: &mut Vec<Segment>) {
        let max = self.config.max_segment_length.max(1);
        let chars: Vec<char> = text.chars().collect();
        let mut offset = base_offset;
        for chunk in chars.chunks(max) {
            let piece: String = chunk.iter().collect();
            let len = piece.len();
            out.push(Segment::new(piece, offset, SegmentKind::ForcedSplit));
            offset += len;
        }
    }

    fn segments_from_llm_response(&self, response: &str) -> Vec<Segment> {
        let mut offset = 0usize;
        response
            .split(LLM_SEGMENT_DELIMITER.trim())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|chunk| {
                let segment = Segment::new(chunk, offset, SegmentKind::LlmGenerated);
                offset += chunk.len();
                segment
            })
            .collect()
    }
}

/// Normalizes line endings and collapses runs of ≥3 newlines to a single
/// blank-line separator (§4.2 step 1).
fn normalize(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut result = String::with_capacity(unified.len());
    let mut newline_run = 0usize;
    for ch in unified.chars() {
        if ch == '\n' {
            newline_run += 1;
            if newline_run <= 2 {
                result.push(ch);
            }
        } else {
            newline_run = 0;
            result.push(ch);
        }
    }
    result
}

fn split_sentences<'a>(paragraph: &'a str, markers: &[char]) -> Vec<&'a str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;
    while i < paragraph.len() {
        let ch = paragraph[i..].chars().next().unwrap();
        let ch_len = ch.len_utf8();
        if markers.contains(&ch) {
            let next = i + ch_len;
            let boundary = next >= paragraph.len() || paragraph[next..].starts_with(char::is_whitespace);
            if boundary {
                sentences.push(&paragraph[start..next]);
                start = next;
            }
        }
        i += ch_len;
    }
    if start < paragraph.len() {
        sentences.push(&paragraph[start..]);
    }
    sentences
}

fn derive_title(content: &str, index: usize) -> String {
    let first_line = content.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        format!("Segment {}", index + 1)
    } else {
        first_line.chars().take(60).collect()
    }
}

/// Three sub-scores per §4.2.
fn score(segments: &[Segment], markers: &[char]) -> SegmentationQuality {
    if segments.is_empty() {
        return SegmentationQuality {
            semantic_integrity: 0.0,
            paragraph_integrity: 0.0,
            length_balance: 0.0,
        };
    }

    let terminated = segments
        .iter()
        .filter(|s| {
            s.content
                .trim_end()
                .ends_with(|c: char| markers.contains(&c))
        })
        .count();
    let semantic_integrity = 100.0 * terminated as f64 / segments.len() as f64;

    let paragraph_count = segments
        .iter()
        .filter(|s| s.kind == SegmentKind::Paragraph)
        .count()
        .max(1);
    let ratio = segments.len() as f64 / paragraph_count as f64;
    let paragraph_integrity = if (1.0..=3.0).contains(&ratio) {
        100.0
    } else if ratio < 1.0 {
        (ratio * 100.0).max(0.0)
    } else {
        (100.0 - (ratio - 3.0) * 20.0).clamp(0.0, 100.0)
    };

    let lengths: Vec<f64> = segments.iter().map(|s| s.char_count as f64).collect();
    let mean = lengths.iter().sum::<f64>() / lengths.len() as f64;
    let variance = if mean > 0.0 {
        lengths.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / lengths.len() as f64
    } else {
        0.0
    };
    let cv = if mean > 0.0 { variance.sqrt() / mean } else { 0.0 };
    let length_balance = if cv <= 0.2 {
        100.0
    } else if cv >= 0.5 {
        50.0
    } else {
        100.0 - (cv - 0.2) / 0.3 * 50.0
    };

    SegmentationQuality {
        semantic_integrity,
        paragraph_integrity,
        length_balance,
    }
}

fn llm_segmentation_prompt(text: &str) -> String {
    format!(
        "Split the following text into coherent segments. Separate each segment with the \
         exact delimiter `{delim}` and emit nothing else.\n\n{text}",
        delim = LLM_SEGMENT_DELIMITER.trim(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use summarizer_shared::traits::SummarizeError;

    fn config() -> SegmentationConfig {
        SegmentationConfig {
            max_segment_length: 50,
            trigger_length: 40,
            sentence_end_markers: vec!['.', '!', '?'],
            preserve_paragraphs: true,
            llm_segmentation_enabled: true,
        }
    }

    #[test]
    fn needs_segmentation_respects_trigger_length() {
        let segmenter = Segmenter::new(config());
        assert!(!segmenter.needs_segmentation("short text"));
        assert!(segmenter.needs_segmentation(&"a".repeat(41)));
    }

    #[tokio::test]
    async fn single_short_paragraph_becomes_one_segment() {
        let segmenter = Segmenter::new(config());
        let result = segmenter
            .segment(&SegmentationRequest {
                text: "One short sentence.".to_string(),
                generate_titles: false,
            })
            .await;
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].content, "One short sentence.");
    }

    #[tokio::test]
    async fn long_paragraph_is_packed_into_multiple_sentence_segments() {
        let segmenter = Segmenter::new(config());
        let text = "Sentence one is here. Sentence two follows now. Sentence three continues. Sentence four ends it.";
        let result = segmenter
            .segment(&SegmentationRequest {
                text: text.to_string(),
                generate_titles: false,
            })
            .await;
        assert!(result.segments.len() > 1);
        for seg in &result.segments {
            assert!(seg.char_count <= config().max_segment_length + 1);
        }
    }

    #[tokio::test]
    async fn concatenation_reproduces_normalized_input() {
        let segmenter = Segmenter::new(config());
        let text = "Part one sentence. Part two sentence. Part three sentence exists.";
        let result = segmenter
            .segment(&SegmentationRequest {
                text: text.to_string(),
                generate_titles: false,
            })
            .await;
        let joined: String = result.segments.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(joined, normalize(text));
    }

    #[test]
    fn normalize_collapses_excess_newlines() {
        assert_eq!(normalize("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(normalize("a\r\nb\rc"), "a\nb\nc");
    }

    #[derive(Debug)]
    struct StubClient {
        response: String,
    }

    #[async_trait::async_trait]
    impl SummarizerClient for StubClient {
        async fn summarize(&self, _text: &str) -> Result<String, SummarizeError> {
            Ok(self.response.clone())
        }
        async fn healthy(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn llm_fallback_adopted_when_it_scores_higher() {
        let unterminated = "word ".repeat(40);
        let client = StubClient {
            response: format!(
                "First segment ends here.{delim}Second segment ends too.{delim}Third piece finishes.",
                delim = LLM_SEGMENT_DELIMITER
            ),
        };
        let segmenter = Segmenter::new(config()).with_client(Arc::new(client));
        let result = segmenter
            .segment(&SegmentationRequest {
                text: unterminated,
                generate_titles: false,
            })
            .await;
        assert!(result.used_llm_fallback);
        assert_eq!(result.segments.len(), 3);
    }
}
