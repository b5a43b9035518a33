//! Analysis prompt construction.

use vreel_models::VideoTranscript;

/// Build the virality analysis prompt for the text-analysis provider.
///
/// The response schema here is the contract the parser relies on; change
/// them together.
pub fn build_analysis_prompt(transcript: &VideoTranscript, video_duration: f64) -> String {
    let segments_json = serde_json::to_string_pretty(&transcript.segments)
        .unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"You are an expert in viral short-form content for TikTok, Instagram Reels and YouTube Shorts.

Analyze this video transcript and identify the best moments to cut into viral clips of 10-60 seconds.

TRANSCRIPT:
{segments_json}

TOTAL DURATION: {video_duration} seconds

VIRALITY CRITERIA:
1. Strong hooks (questions, surprising claims, "how", "why", "secret")
2. High-emotion moments (laughter, surprise, reveals)
3. Punchlines and quotable lines
4. Natural transitions for cutting
5. Short, punchy sentences
6. Calls to action and rhetorical questions

INSTRUCTIONS:
- Identify 5-10 segments with high viral potential
- Give each segment a virality score (0-100)
- Explain the reasons behind each score (hooks, emotion, impact)
- Suggest an optimal clip duration (10-60 seconds)
- Segments must start and end on complete sentences from the transcript

RESPOND ONLY IN JSON with this structure:
{{
  "overallScore": 0-100,
  "segments": [
    {{
      "startTime": seconds,
      "endTime": seconds,
      "score": 0-100,
      "reasons": ["reason1", "reason2"],
      "signals": [
        {{
          "type": "textual" | "audio" | "visual",
          "name": "hook" | "emotion" | "question" | "punchline",
          "confidence": 0-1,
          "timestamp": seconds,
          "description": "description"
        }}
      ],
      "suggestedClipDuration": seconds
    }}
  ],
  "recommendations": {{
    "bestMoments": [{{"start": seconds, "end": seconds}}],
    "suggestedHooks": ["hook1", "hook2"],
    "platformOptimizations": {{
      "tiktok": ["tip1", "tip2"],
      "instagram": ["tip1", "tip2"],
      "youtube": ["tip1", "tip2"]
    }}
  }}
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use vreel_models::{TranscriptSegment, VideoTranscript};

    #[test]
    fn test_prompt_carries_transcript_and_duration() {
        let transcript = VideoTranscript::from_segments(
            "en",
            vec![TranscriptSegment {
                text: "An unmistakable sentence.".to_string(),
                start: 0.0,
                end: 2.0,
                words: Vec::new(),
            }],
        );

        let prompt = build_analysis_prompt(&transcript, 120.0);
        assert!(prompt.contains("An unmistakable sentence."));
        assert!(prompt.contains("TOTAL DURATION: 120 seconds"));
        assert!(prompt.contains("5-10 segments"));
        assert!(prompt.contains("\"suggestedClipDuration\""));
        assert!(prompt.contains("RESPOND ONLY IN JSON"));
    }
}
