//! Virality analysis models.
//!
//! These types mirror the JSON contract of the analysis provider response,
//! hence the camelCase field renames.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Plan-independent bounds on a suggested clip duration, in seconds.
pub const MIN_CLIP_DURATION_SECS: f64 = 10.0;
pub const MAX_CLIP_DURATION_SECS: f64 = 60.0;

/// Origin of a virality signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    /// Derived from the transcript text (hooks, questions, punchlines)
    Textual,
    /// Derived from the audio track (energy, laughter)
    Audio,
    /// Derived from the picture (reserved, no producer yet)
    Visual,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Textual => "textual",
            SignalType::Audio => "audio",
            SignalType::Visual => "visual",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One detected viral cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ViralitySignal {
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    /// Short cue name ("hook", "emotion", "question", "punchline", ...).
    pub name: String,
    /// Detection confidence in [0, 1].
    pub confidence: f64,
    /// Offset in seconds from the beginning of the video.
    pub timestamp: f64,
    pub description: String,
}

/// A candidate clip window with its virality score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViralitySegment {
    pub start_time: f64,
    pub end_time: f64,
    /// Viral potential in [0, 100].
    pub score: f64,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub signals: Vec<ViralitySignal>,
    /// Recommended clip length in seconds, within [10, 60].
    pub suggested_clip_duration: f64,
}

impl ViralitySegment {
    /// Window length in seconds.
    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }

    /// Whether `timestamp` falls inside this window (inclusive bounds).
    pub fn contains(&self, timestamp: f64) -> bool {
        timestamp >= self.start_time && timestamp <= self.end_time
    }
}

/// A plain start/end span in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

/// Per-platform publishing advice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlatformOptimizations {
    #[serde(default)]
    pub tiktok: Vec<String>,
    #[serde(default)]
    pub instagram: Vec<String>,
    #[serde(default)]
    pub youtube: Vec<String>,
}

/// Editorial recommendations attached to an analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    #[serde(default)]
    pub best_moments: Vec<TimeRange>,
    #[serde(default)]
    pub suggested_hooks: Vec<String>,
    #[serde(default)]
    pub platform_optimizations: PlatformOptimizations,
}

/// Full analysis result for one video. Immutable once produced; signal
/// combination derives a new value rather than patching segments in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViralityAnalysis {
    /// Whole-video viral potential in [0, 100].
    pub overall_score: f64,
    #[serde(default)]
    pub segments: Vec<ViralitySegment>,
    #[serde(default)]
    pub recommendations: Recommendations,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_contains_inclusive_bounds() {
        let seg = ViralitySegment {
            start_time: 10.0,
            end_time: 25.0,
            score: 80.0,
            reasons: Vec::new(),
            signals: Vec::new(),
            suggested_clip_duration: 15.0,
        };
        assert!(seg.contains(10.0));
        assert!(seg.contains(25.0));
        assert!(seg.contains(17.5));
        assert!(!seg.contains(9.999));
        assert!(!seg.contains(25.001));
    }

    #[test]
    fn test_analysis_wire_field_names() {
        let json = r#"{
            "overallScore": 72,
            "segments": [{
                "startTime": 0,
                "endTime": 20,
                "score": 85,
                "reasons": ["strong opening"],
                "signals": [{
                    "type": "textual",
                    "name": "hook",
                    "confidence": 0.9,
                    "timestamp": 1.5,
                    "description": "direct question to the viewer"
                }],
                "suggestedClipDuration": 18
            }],
            "recommendations": {
                "bestMoments": [{"start": 0, "end": 20}],
                "suggestedHooks": ["open on the question"],
                "platformOptimizations": {
                    "tiktok": [],
                    "instagram": [],
                    "youtube": []
                }
            }
        }"#;

        let analysis: ViralityAnalysis = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.overall_score, 72.0);
        assert_eq!(analysis.segments.len(), 1);
        assert_eq!(analysis.segments[0].signals[0].signal_type, SignalType::Textual);
        assert_eq!(analysis.segments[0].suggested_clip_duration, 18.0);

        let back = serde_json::to_value(&analysis).unwrap();
        assert!(back.get("overallScore").is_some());
        assert!(back["segments"][0].get("startTime").is_some());
    }

    #[test]
    fn test_missing_arrays_default_empty() {
        let json = r#"{"overallScore": 50}"#;
        let analysis: ViralityAnalysis = serde_json::from_str(json).unwrap();
        assert!(analysis.segments.is_empty());
        assert!(analysis.recommendations.suggested_hooks.is_empty());
    }
}
