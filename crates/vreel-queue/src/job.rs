//! Job payloads for the processing queues.

use serde::{Deserialize, Serialize};

use vreel_models::{ClipId, ClipSettings, Plan, VideoId, VideoTranscript};

/// Queue a payload is routed to.
///
/// Intake, transcription and analysis share the `video-processing`
/// queue; per-clip rendering runs on the `clip-generation` queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueName {
    VideoProcessing,
    ClipGeneration,
}

impl QueueName {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueName::VideoProcessing => "video-processing",
            QueueName::ClipGeneration => "clip-generation",
        }
    }
}

impl std::fmt::Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Job to take a freshly admitted upload through intake.
///
/// First step of the pipeline. The worker resolves a fetchable media URL
/// for the stored upload so later stages never touch storage directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoProcessingJob {
    /// Video ID
    pub video_id: VideoId,
    /// Owning user ID
    pub user_id: String,
    /// Plan the upload was admitted under
    pub plan: Plan,
    /// Storage location of the raw upload
    pub storage_key: String,
    /// Original filename, for logs
    pub filename: String,
}

impl VideoProcessingJob {
    /// Create a new intake job.
    pub fn new(
        video_id: VideoId,
        user_id: impl Into<String>,
        plan: Plan,
        storage_key: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            video_id,
            user_id: user_id.into(),
            plan,
            storage_key: storage_key.into(),
            filename: filename.into(),
        }
    }

    /// Generate idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("video-{}", self.video_id)
    }
}

/// Job to transcribe a video's audio track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionJob {
    /// Video ID
    pub video_id: VideoId,
    /// Fetchable URL of the media to transcribe
    pub media_url: String,
    /// Optional language hint passed through to the transcription provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl TranscriptionJob {
    /// Create a new transcription job.
    pub fn new(video_id: VideoId, media_url: impl Into<String>) -> Self {
        Self {
            video_id,
            media_url: media_url.into(),
            language: None,
        }
    }

    /// Set the language hint.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Generate idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("transcribe-{}", self.video_id)
    }
}

/// Job to score a transcript for viral segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisJob {
    /// Video ID
    pub video_id: VideoId,
    /// Transcript produced by the transcription stage
    pub transcript: VideoTranscript,
    /// Fetchable URL of the media, for audio feature extraction
    pub media_url: String,
    /// Total video duration in seconds
    pub duration_secs: f64,
}

impl AnalysisJob {
    /// Create a new analysis job.
    pub fn new(
        video_id: VideoId,
        transcript: VideoTranscript,
        media_url: impl Into<String>,
        duration_secs: f64,
    ) -> Self {
        Self {
            video_id,
            transcript,
            media_url: media_url.into(),
            duration_secs,
        }
    }

    /// Generate idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("analyze-{}", self.video_id)
    }
}

/// Job to render a single clip from a scored segment.
///
/// The atomic unit of fan-out. Each job produces exactly one clip so a
/// failure stays isolated to the segment that caused it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipGenerationJob {
    /// Clip ID
    pub clip_id: ClipId,
    /// Source video ID
    pub video_id: VideoId,
    /// Owning user ID
    pub user_id: String,
    /// Plan the clip is rendered under
    pub plan: Plan,
    /// Fetchable URL of the source media
    pub media_url: String,
    /// Clip start within the source, in seconds
    pub start_time: f64,
    /// Clip end within the source, in seconds
    pub end_time: f64,
    /// Render settings
    pub settings: ClipSettings,
}

impl ClipGenerationJob {
    /// Create a new clip render job with default settings.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clip_id: ClipId,
        video_id: VideoId,
        user_id: impl Into<String>,
        plan: Plan,
        media_url: impl Into<String>,
        start_time: f64,
        end_time: f64,
    ) -> Self {
        Self {
            clip_id,
            video_id,
            user_id: user_id.into(),
            plan,
            media_url: media_url.into(),
            start_time,
            end_time,
            settings: ClipSettings::default(),
        }
    }

    /// Set render settings.
    pub fn with_settings(mut self, settings: ClipSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Clip length in seconds.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Generate idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("clip-{}", self.clip_id)
    }
}

/// Generic payload wrapper for queue storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobPayload {
    /// Intake: resolve the media URL for an admitted upload
    VideoProcessing(VideoProcessingJob),
    /// Transcribe the audio track
    Transcription(TranscriptionJob),
    /// Score the transcript for viral segments
    Analysis(AnalysisJob),
    /// Render a single clip
    ClipGeneration(ClipGenerationJob),
}

impl JobPayload {
    pub fn video_id(&self) -> &VideoId {
        match self {
            JobPayload::VideoProcessing(j) => &j.video_id,
            JobPayload::Transcription(j) => &j.video_id,
            JobPayload::Analysis(j) => &j.video_id,
            JobPayload::ClipGeneration(j) => &j.video_id,
        }
    }

    /// Queue this payload is routed to.
    pub fn queue(&self) -> QueueName {
        match self {
            JobPayload::VideoProcessing(_)
            | JobPayload::Transcription(_)
            | JobPayload::Analysis(_) => QueueName::VideoProcessing,
            JobPayload::ClipGeneration(_) => QueueName::ClipGeneration,
        }
    }

    /// Stage label for logs and metrics.
    pub fn stage(&self) -> &'static str {
        match self {
            JobPayload::VideoProcessing(_) => "video_processing",
            JobPayload::Transcription(_) => "transcription",
            JobPayload::Analysis(_) => "analysis",
            JobPayload::ClipGeneration(_) => "clip_generation",
        }
    }

    pub fn idempotency_key(&self) -> String {
        match self {
            JobPayload::VideoProcessing(j) => j.idempotency_key(),
            JobPayload::Transcription(j) => j.idempotency_key(),
            JobPayload::Analysis(j) => j.idempotency_key(),
            JobPayload::ClipGeneration(j) => j.idempotency_key(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_serde_roundtrip() {
        let job = TranscriptionJob::new(VideoId::new(), "https://cdn.example.com/raw.mp4")
            .with_language("en");

        let wrapper = JobPayload::Transcription(job.clone());
        let json = serde_json::to_string(&wrapper).expect("serialize JobPayload");
        let decoded: JobPayload = serde_json::from_str(&json).expect("deserialize JobPayload");

        match decoded {
            JobPayload::Transcription(j) => {
                assert_eq!(j.video_id, job.video_id);
                assert_eq!(j.media_url, job.media_url);
                assert_eq!(j.language, job.language);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_payload_wire_field_names() {
        let video_id = VideoId::from_string("vid_1");
        let job = VideoProcessingJob::new(
            video_id,
            "user_1",
            Plan::Creator,
            "uploads/vid_1/raw.mp4",
            "raw.mp4",
        );
        let json = serde_json::to_string(&JobPayload::VideoProcessing(job)).expect("serialize");

        assert!(json.contains("\"type\":\"video_processing\""));
        assert!(json.contains("\"videoId\""));
        assert!(json.contains("\"userId\""));
        assert!(json.contains("\"storageKey\""));
    }

    #[test]
    fn test_idempotency_keys() {
        let video_id = VideoId::from_string("vid_1");
        let clip_id = ClipId::for_segment(&video_id, 0);

        let intake = VideoProcessingJob::new(
            video_id.clone(),
            "user_1",
            Plan::Free,
            "uploads/vid_1/raw.mp4",
            "raw.mp4",
        );
        assert_eq!(intake.idempotency_key(), "video-vid_1");

        let transcribe = TranscriptionJob::new(video_id.clone(), "https://cdn.example.com/v.mp4");
        assert_eq!(transcribe.idempotency_key(), "transcribe-vid_1");

        let analyze = AnalysisJob::new(
            video_id.clone(),
            VideoTranscript::from_segments("en", Vec::new()),
            "https://cdn.example.com/v.mp4",
            120.0,
        );
        assert_eq!(analyze.idempotency_key(), "analyze-vid_1");

        let clip = ClipGenerationJob::new(
            clip_id,
            video_id,
            "user_1",
            Plan::Free,
            "https://cdn.example.com/v.mp4",
            10.0,
            40.0,
        );
        assert_eq!(clip.idempotency_key(), "clip-vid_1-clip-0");
    }

    #[test]
    fn test_payload_routing() {
        let video_id = VideoId::new();
        let transcribe =
            JobPayload::Transcription(TranscriptionJob::new(video_id.clone(), "url"));
        assert_eq!(transcribe.queue(), QueueName::VideoProcessing);

        let clip = JobPayload::ClipGeneration(ClipGenerationJob::new(
            ClipId::for_segment(&video_id, 1),
            video_id,
            "user_1",
            Plan::Pro,
            "url",
            0.0,
            30.0,
        ));
        assert_eq!(clip.queue(), QueueName::ClipGeneration);
        assert_eq!(clip.stage(), "clip_generation");
    }
}
