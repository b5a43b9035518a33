//! Virality analysis orchestration.
//!
//! Builds the analysis prompt from a transcript, runs it through a
//! `TextAnalysisProvider`, parses the response strictly and degrades to a
//! conservative default when the response is not valid structured output.
//! Also hosts the signal combiner that folds audio-derived cues into the
//! text-derived segment scores.

pub mod combine;
pub mod orchestrator;
pub mod parse;
pub mod prompt;

pub use combine::{analyze_audio_features, combine_analysis_signals};
pub use orchestrator::ViralityAnalyzer;
pub use parse::{default_analysis, parse_analysis_response, sanitize_analysis};
pub use prompt::build_analysis_prompt;
