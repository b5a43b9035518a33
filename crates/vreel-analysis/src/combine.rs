//! Audio signal combination.

use vreel_models::{ViralityAnalysis, ViralitySignal};

/// Fold audio-derived signals into a text-derived analysis.
///
/// Each segment absorbs the audio signals stamped inside its window: the
/// score gains `confidence * 10` per signal, capped at 100, and the signals
/// are appended to the segment's list in timestamp order so the result does
/// not depend on arrival order. Segments with no matching signals are
/// returned untouched. Produces a new analysis; the input is not mutated.
pub fn combine_analysis_signals(
    analysis: &ViralityAnalysis,
    audio_signals: &[ViralitySignal],
) -> ViralityAnalysis {
    let enhanced = analysis
        .segments
        .iter()
        .map(|segment| {
            let mut matched: Vec<ViralitySignal> = audio_signals
                .iter()
                .filter(|signal| segment.contains(signal.timestamp))
                .cloned()
                .collect();

            if matched.is_empty() {
                return segment.clone();
            }

            matched.sort_by(|a, b| {
                a.timestamp
                    .partial_cmp(&b.timestamp)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.name.cmp(&b.name))
            });

            let boost: f64 = matched.iter().map(|signal| signal.confidence * 10.0).sum();

            let mut combined = segment.clone();
            combined.score = (combined.score + boost).min(100.0);
            combined.signals.extend(matched);
            combined
        })
        .collect();

    ViralityAnalysis {
        overall_score: analysis.overall_score,
        segments: enhanced,
        recommendations: analysis.recommendations.clone(),
    }
}

/// Placeholder audio analysis. Energy/laughter detection needs an audio
/// pipeline this crate does not have; callers combine an empty signal set
/// until one exists.
pub fn analyze_audio_features(_media_url: &str) -> Vec<ViralitySignal> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vreel_models::{Recommendations, SignalType, ViralitySegment};

    fn audio_signal(name: &str, confidence: f64, timestamp: f64) -> ViralitySignal {
        ViralitySignal {
            signal_type: SignalType::Audio,
            name: name.to_string(),
            confidence,
            timestamp,
            description: String::new(),
        }
    }

    fn segment(start: f64, end: f64, score: f64) -> ViralitySegment {
        ViralitySegment {
            start_time: start,
            end_time: end,
            score,
            reasons: vec!["test".to_string()],
            signals: Vec::new(),
            suggested_clip_duration: 20.0,
        }
    }

    fn analysis(segments: Vec<ViralitySegment>) -> ViralityAnalysis {
        ViralityAnalysis {
            overall_score: 60.0,
            segments,
            recommendations: Recommendations::default(),
        }
    }

    #[test]
    fn test_boost_is_sum_of_confidences_times_ten() {
        let input = analysis(vec![segment(0.0, 30.0, 50.0)]);
        let signals = vec![
            audio_signal("energy", 0.5, 10.0),
            audio_signal("laughter", 0.3, 20.0),
        ];

        let combined = combine_analysis_signals(&input, &signals);
        assert_eq!(combined.segments[0].score, 58.0);
        assert_eq!(combined.segments[0].signals.len(), 2);
        // Input untouched
        assert_eq!(input.segments[0].score, 50.0);
        assert!(input.segments[0].signals.is_empty());
    }

    #[test]
    fn test_score_never_exceeds_100() {
        let input = analysis(vec![segment(0.0, 30.0, 95.0)]);
        let signals: Vec<_> = (0..20)
            .map(|i| audio_signal("energy", 1.0, i as f64))
            .collect();

        let combined = combine_analysis_signals(&input, &signals);
        assert_eq!(combined.segments[0].score, 100.0);
    }

    #[test]
    fn test_unmatched_segments_pass_through_equal() {
        let input = analysis(vec![segment(0.0, 10.0, 40.0), segment(50.0, 60.0, 70.0)]);
        let signals = vec![audio_signal("energy", 0.9, 55.0)];

        let combined = combine_analysis_signals(&input, &signals);
        // First segment has no matching signal and must compare equal
        assert_eq!(combined.segments[0], input.segments[0]);
        assert_eq!(combined.segments[1].score, 79.0);
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let input = analysis(vec![segment(10.0, 20.0, 50.0)]);
        let signals = vec![
            audio_signal("on-start", 0.4, 10.0),
            audio_signal("on-end", 0.4, 20.0),
            audio_signal("just-outside", 0.4, 20.001),
        ];

        let combined = combine_analysis_signals(&input, &signals);
        assert_eq!(combined.segments[0].signals.len(), 2);
        assert_eq!(combined.segments[0].score, 58.0);
    }

    #[test]
    fn test_arrival_order_does_not_matter() {
        let input = analysis(vec![segment(0.0, 30.0, 10.0)]);
        let forward = vec![
            audio_signal("a", 0.2, 5.0),
            audio_signal("b", 0.4, 15.0),
            audio_signal("c", 0.6, 25.0),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let one = combine_analysis_signals(&input, &forward);
        let two = combine_analysis_signals(&input, &reversed);
        assert_eq!(one, two);
    }
}
