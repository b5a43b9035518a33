//! The analysis orchestrator: prompt, call, parse, degrade.

use std::sync::Arc;

use tracing::{info, warn};

use vreel_models::{VideoTranscript, ViralityAnalysis};
use vreel_providers::{ProviderResult, TextAnalysisProvider};

use crate::parse::{default_analysis, parse_analysis_response, sanitize_analysis};
use crate::prompt::build_analysis_prompt;

/// Runs transcript analysis against an injected `TextAnalysisProvider`.
pub struct ViralityAnalyzer {
    provider: Arc<dyn TextAnalysisProvider>,
}

impl ViralityAnalyzer {
    /// Create a new analyzer over the given provider.
    pub fn new(provider: Arc<dyn TextAnalysisProvider>) -> Self {
        Self { provider }
    }

    /// Analyze a transcript for viral clip candidates.
    ///
    /// Transport errors propagate (the dispatcher retries those). A response
    /// that is not valid structured output does NOT error; it degrades to
    /// the default analysis so downstream stages keep moving.
    pub async fn analyze_transcript(
        &self,
        transcript: &VideoTranscript,
        video_duration: f64,
    ) -> ProviderResult<ViralityAnalysis> {
        let prompt = build_analysis_prompt(transcript, video_duration);
        let response = self.provider.analyze(&prompt).await?;

        let analysis = match parse_analysis_response(&response) {
            Some(parsed) => sanitize_analysis(parsed, video_duration),
            None => {
                warn!("Falling back to the default analysis");
                default_analysis()
            }
        };

        info!(
            overall_score = analysis.overall_score,
            segments = analysis.segments.len(),
            "Virality analysis complete"
        );
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use vreel_models::TranscriptSegment;
    use vreel_providers::ProviderError;

    struct CannedProvider {
        response: Result<String, fn() -> ProviderError>,
    }

    #[async_trait]
    impl TextAnalysisProvider for CannedProvider {
        async fn analyze(&self, _prompt: &str) -> ProviderResult<String> {
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn transcript() -> VideoTranscript {
        VideoTranscript::from_segments(
            "en",
            vec![TranscriptSegment {
                text: "Why does nobody talk about this?".to_string(),
                start: 0.0,
                end: 3.0,
                words: Vec::new(),
            }],
        )
    }

    #[tokio::test]
    async fn test_valid_response_is_parsed_and_sanitized() {
        let provider = Arc::new(CannedProvider {
            response: Ok(r#"```json
            {
                "overallScore": 75,
                "segments": [{
                    "startTime": 0, "endTime": 30, "score": 250,
                    "reasons": [], "signals": [], "suggestedClipDuration": 20
                }],
                "recommendations": {
                    "bestMoments": [], "suggestedHooks": [],
                    "platformOptimizations": {"tiktok": [], "instagram": [], "youtube": []}
                }
            }
            ```"#
                .to_string()),
        });

        let analyzer = ViralityAnalyzer::new(provider);
        let analysis = analyzer.analyze_transcript(&transcript(), 60.0).await.unwrap();

        assert_eq!(analysis.overall_score, 75.0);
        assert_eq!(analysis.segments.len(), 1);
        assert_eq!(analysis.segments[0].score, 100.0); // clamped
    }

    #[tokio::test]
    async fn test_unparsable_response_degrades_to_default() {
        let provider = Arc::new(CannedProvider {
            response: Ok("Sorry, I cannot help with that.".to_string()),
        });

        let analyzer = ViralityAnalyzer::new(provider);
        let analysis = analyzer.analyze_transcript(&transcript(), 60.0).await.unwrap();

        assert_eq!(analysis.overall_score, 50.0);
        assert!(analysis.segments.is_empty());
        assert!(!analysis
            .recommendations
            .platform_optimizations
            .tiktok
            .is_empty());
    }

    #[tokio::test]
    async fn test_transport_errors_propagate() {
        let provider = Arc::new(CannedProvider {
            response: Err(|| ProviderError::unavailable("upstream down")),
        });

        let analyzer = ViralityAnalyzer::new(provider);
        let err = analyzer
            .analyze_transcript(&transcript(), 60.0)
            .await
            .unwrap_err();

        assert!(err.is_transient());
    }
}
