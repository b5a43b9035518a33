//! Strict response parsing with a defined fallback.
//!
//! Pulling JSON out of a free-text model response is inherently best-effort.
//! The contract: either the response yields a fully valid analysis, or the
//! caller gets the conservative default. Parsing never fails the pipeline.

use tracing::warn;

use vreel_models::virality::{MAX_CLIP_DURATION_SECS, MIN_CLIP_DURATION_SECS};
use vreel_models::{PlatformOptimizations, Recommendations, ViralityAnalysis};

/// Parse a provider response into an analysis, tolerating markdown fences
/// and surrounding prose. `None` when no valid analysis can be extracted.
pub fn parse_analysis_response(text: &str) -> Option<ViralityAnalysis> {
    let stripped = strip_code_fences(text);
    let json = extract_json_object(stripped)?;

    match serde_json::from_str::<ViralityAnalysis>(json) {
        Ok(analysis) => Some(analysis),
        Err(e) => {
            warn!(error = %e, "Analysis response was not valid structured output");
            None
        }
    }
}

/// The analysis used when the provider response cannot be parsed: neutral
/// overall score, no segments, generic per-platform advice. Downstream
/// stages degrade gracefully instead of aborting.
pub fn default_analysis() -> ViralityAnalysis {
    ViralityAnalysis {
        overall_score: 50.0,
        segments: Vec::new(),
        recommendations: Recommendations {
            best_moments: Vec::new(),
            suggested_hooks: Vec::new(),
            platform_optimizations: PlatformOptimizations {
                tiktok: vec!["Use a strong hook in the first seconds".to_string()],
                instagram: vec!["Add subtitles for silent viewing".to_string()],
                youtube: vec!["Optimize the first 3 seconds".to_string()],
            },
        },
    }
}

/// Enforce per-segment invariants on a parsed analysis: scores in [0, 100],
/// suggested durations in [10, 60], windows inside the video, signal
/// timestamps inside the video. Segments the model invented outside the
/// video are dropped rather than clamped.
pub fn sanitize_analysis(mut analysis: ViralityAnalysis, video_duration: f64) -> ViralityAnalysis {
    analysis.overall_score = analysis.overall_score.clamp(0.0, 100.0);

    analysis.segments.retain(|segment| {
        let valid = segment.end_time > segment.start_time
            && segment.start_time >= 0.0
            && segment.end_time <= video_duration;
        if !valid {
            warn!(
                start = segment.start_time,
                end = segment.end_time,
                "Dropping segment outside the video"
            );
        }
        valid
    });

    for segment in &mut analysis.segments {
        segment.score = segment.score.clamp(0.0, 100.0);
        segment.suggested_clip_duration = segment
            .suggested_clip_duration
            .clamp(MIN_CLIP_DURATION_SECS, MAX_CLIP_DURATION_SECS);
        segment
            .signals
            .retain(|signal| signal.timestamp >= 0.0 && signal.timestamp <= video_duration);
    }

    analysis
}

fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text.strip_prefix("```json").unwrap_or(text);
    let text = text.strip_prefix("```").unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

/// The outermost `{...}` span, covering responses that wrap the JSON in
/// prose ("Here is the analysis: {...} Hope this helps!").
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
