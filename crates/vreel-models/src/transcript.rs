//! Transcript models produced by the transcription stage.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single recognized word with its timing and confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptWord {
    pub word: String,
    /// Start offset in seconds from the beginning of the video.
    pub start: f64,
    /// End offset in seconds.
    pub end: f64,
    /// Recognition confidence in [0, 1].
    pub confidence: f64,
}

/// One utterance: a sentence-ish span of speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptSegment {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub words: Vec<TranscriptWord>,
}

impl TranscriptSegment {
    /// Span length in seconds.
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Full transcript of a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoTranscript {
    /// BCP-47 language tag reported by the transcription provider.
    pub language: String,
    /// Utterances ordered by start time, non-overlapping.
    pub segments: Vec<TranscriptSegment>,
    /// The full transcript as one string.
    pub full_text: String,
}

impl VideoTranscript {
    /// Build a transcript from segments, deriving `full_text` by joining
    /// segment texts.
    pub fn from_segments(language: impl Into<String>, segments: Vec<TranscriptSegment>) -> Self {
        let full_text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            language: language.into(),
            segments,
            full_text,
        }
    }

    /// End offset of the last utterance, in seconds.
    pub fn spoken_duration(&self) -> f64 {
        self.segments.last().map(|s| s.end).unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(text: &str, start: f64, end: f64) -> TranscriptSegment {
        TranscriptSegment {
            text: text.to_string(),
            start,
            end,
            words: Vec::new(),
        }
    }

    #[test]
    fn test_from_segments_joins_full_text() {
        let t = VideoTranscript::from_segments(
            "en",
            vec![segment("Hello there.", 0.0, 1.2), segment("Welcome back.", 1.4, 2.8)],
        );
        assert_eq!(t.full_text, "Hello there. Welcome back.");
        assert_eq!(t.segments.len(), 2);
    }

    #[test]
    fn test_spoken_duration() {
        let t = VideoTranscript::from_segments("en", vec![segment("a", 0.0, 1.0), segment("b", 1.5, 4.25)]);
        assert!((t.spoken_duration() - 4.25).abs() < f64::EPSILON);
        assert_eq!(VideoTranscript::from_segments("en", vec![]).spoken_duration(), 0.0);
    }

    #[test]
    fn test_segment_duration_never_negative() {
        assert_eq!(segment("x", 5.0, 3.0).duration(), 0.0);
    }
}
