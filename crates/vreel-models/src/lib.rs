//! Shared data models for the ViralReels pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Subscription plans, limits and dispatch priority
//! - Video and job identifiers
//! - Transcripts (words, segments, full text)
//! - Virality analysis results and signals
//! - Clip generation settings

pub mod ids;
pub mod job;
pub mod plan;
pub mod quality;
pub mod settings;
pub mod transcript;
pub mod virality;

// Re-export common types
pub use ids::{ClipId, VideoId};
pub use job::{JobId, JobState};
pub use plan::{priority_of, Plan, PlanLimits, PlanUsage, Priority};
pub use quality::VideoQuality;
pub use settings::{AspectRatio, ClipSettings};
pub use transcript::{TranscriptSegment, TranscriptWord, VideoTranscript};
pub use virality::{
    PlatformOptimizations, Recommendations, SignalType, TimeRange, ViralityAnalysis,
    ViralitySegment, ViralitySignal,
};
