//! Capability interfaces injected into the pipeline.

use async_trait::async_trait;
use serde::Serialize;

use vreel_models::{ClipId, ClipSettings, Plan, PlanUsage, VideoId, VideoTranscript};

use crate::error::ProviderResult;

/// Resolves logical video/clip identities to fetchable media URLs.
/// The pipeline never manages bytes directly.
#[async_trait]
pub trait StorageLocator: Send + Sync {
    /// A URL from which the source video can be fetched for processing.
    async fn media_url(&self, video_id: &VideoId) -> ProviderResult<String>;

    /// A URL from which a finished clip can be fetched.
    async fn clip_url(&self, clip_id: &ClipId) -> ProviderResult<String>;
}

/// Speech-to-text capability.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Transcribe the media at `media_url`. `language_hint` biases language
    /// detection when the caller knows the spoken language.
    async fn transcribe(
        &self,
        media_url: &str,
        language_hint: Option<&str>,
    ) -> ProviderResult<VideoTranscript>;
}

/// Large-language-model text analysis capability.
///
/// Returns the raw response text, which may or may not contain valid
/// structured output; tolerating malformed output is the caller's job.
#[async_trait]
pub trait TextAnalysisProvider: Send + Sync {
    async fn analyze(&self, prompt: &str) -> ProviderResult<String>;
}

/// Read-only source of a subscriber's current plan and consumption.
/// Billing lifecycle lives elsewhere.
#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn plan_for(&self, user_id: &str) -> ProviderResult<Plan>;

    async fn usage_for(&self, user_id: &str) -> ProviderResult<PlanUsage>;
}

/// Everything the renderer needs to cut one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipCut {
    pub clip_id: ClipId,
    pub video_id: VideoId,
    pub media_url: String,
    pub start_time: f64,
    pub end_time: f64,
    pub settings: ClipSettings,
}

/// A finished clip, addressable by URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedClip {
    pub clip_id: ClipId,
    pub url: String,
}

/// Video cutting/encoding capability. Codec work is outside the pipeline;
/// this seam hands it to whatever renderer the deployment wires in.
#[async_trait]
pub trait ClipRenderer: Send + Sync {
    async fn render(&self, cut: &ClipCut) -> ProviderResult<RenderedClip>;
}
