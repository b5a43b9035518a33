//! Stage sequencing and per-video state tracking.
//!
//! The pipeline admits an upload, enqueues the intake job, then advances
//! the video one stage at a time as workers hand artifacts back: media
//! URL, transcript, analysis, rendered clips. Retry behavior lives in the
//! dispatcher, provider execution in the worker pool; this module only
//! decides what runs next.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, info, warn};

use vreel_models::{
    priority_of, ClipId, ClipSettings, JobId, Plan, PlanLimits, VideoId, VideoTranscript,
    ViralityAnalysis, ViralitySegment,
};
use vreel_providers::{PlanStore, RenderedClip};
use vreel_queue::{
    AnalysisJob, ClipGenerationJob, Dispatcher, JobPayload, JobSnapshot, QueueName, QueueStats,
    TranscriptionJob, VideoProcessingJob,
};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::policy::{check_upload, UploadRequest};

/// Where a video stands in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    Processing,
    Transcribing,
    Analyzing,
    GeneratingClips,
    Completed,
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Processing => "processing",
            VideoStatus::Transcribing => "transcribing",
            VideoStatus::Analyzing => "analyzing",
            VideoStatus::GeneratingClips => "generating_clips",
            VideoStatus::Completed => "completed",
            VideoStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Completed | VideoStatus::Failed)
    }
}

impl std::fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything tracked for one submitted video.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoState {
    pub video_id: VideoId,
    pub user_id: String,
    pub plan: Plan,
    pub filename: String,
    pub status: VideoStatus,
    pub duration_secs: u64,
    pub settings: ClipSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Effective threshold for this video (request override or the
    /// pipeline default).
    pub publish_threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ViralityAnalysis>,
    /// Clip jobs submitted for this video.
    pub expected_clips: usize,
    /// Clip jobs that reached a terminal outcome.
    pub settled_clips: usize,
    pub clips: Vec<RenderedClip>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Handle returned to the submitter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub video_id: VideoId,
    pub job_id: JobId,
    pub plan: Plan,
}

/// Pick which analyzed segments become clips.
///
/// Segments below `threshold` are dropped, the rest sort by score
/// descending with earlier start times breaking ties, and `max_clips`
/// truncates the result. The returned order is stable, so clip IDs
/// derived from positions in it are too.
pub fn select_segments(
    analysis: &ViralityAnalysis,
    threshold: f64,
    max_clips: u32,
) -> Vec<ViralitySegment> {
    let mut picked: Vec<ViralitySegment> = analysis
        .segments
        .iter()
        .filter(|segment| segment.score >= threshold)
        .cloned()
        .collect();
    picked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                a.start_time
                    .partial_cmp(&b.start_time)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });
    picked.truncate(max_clips as usize);
    picked
}

/// Sequences upload intake, transcription, analysis and clip fan-out.
///
/// Owns the dispatcher and the per-video state registry. Cloning is cheap
/// and clones share all state.
#[derive(Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    dispatcher: Dispatcher,
    plans: Arc<dyn PlanStore>,
    videos: Arc<Mutex<HashMap<VideoId, VideoState>>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, plans: Arc<dyn PlanStore>) -> Self {
        Self::with_dispatcher(config, plans, Dispatcher::new())
    }

    /// Build over a caller-constructed dispatcher, e.g. with custom retry
    /// policies.
    pub fn with_dispatcher(
        config: PipelineConfig,
        plans: Arc<dyn PlanStore>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            config,
            dispatcher,
            plans,
            videos: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn lock_videos(&self) -> MutexGuard<'_, HashMap<VideoId, VideoState>> {
        // Recover the guard on poison; state updates never leave partial state.
        self.videos.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Admit an upload and enqueue its intake job.
    ///
    /// Resolves the subscriber's plan and usage, validates the request
    /// against the plan limits and rejects violations synchronously;
    /// nothing is enqueued for a rejected upload.
    pub async fn submit_upload(&self, request: UploadRequest) -> PipelineResult<UploadReceipt> {
        let plan = self.plans.plan_for(&request.user_id).await?;
        let usage = self.plans.usage_for(&request.user_id).await?;
        check_upload(&request, plan, &usage)?;

        let video_id = VideoId::new();
        let threshold = request
            .publish_threshold
            .unwrap_or(self.config.publish_threshold);

        // Track before enqueueing so stage callbacks always find the record.
        {
            let mut videos = self.lock_videos();
            videos.insert(
                video_id.clone(),
                VideoState {
                    video_id: video_id.clone(),
                    user_id: request.user_id.clone(),
                    plan,
                    filename: request.filename.clone(),
                    status: VideoStatus::Processing,
                    duration_secs: request.duration_secs,
                    settings: request.settings.clone(),
                    language: request.language.clone(),
                    publish_threshold: threshold,
                    media_url: None,
                    analysis: None,
                    expected_clips: 0,
                    settled_clips: 0,
                    clips: Vec::new(),
                    error: None,
                },
            );
        }

        let storage_key = format!("uploads/{}/{}", video_id, request.filename);
        let job = VideoProcessingJob::new(
            video_id.clone(),
            request.user_id.clone(),
            plan,
            storage_key,
            request.filename,
        );
        let outcome = match self
            .dispatcher
            .enqueue(JobPayload::VideoProcessing(job), priority_of(plan))
        {
            Ok(outcome) => outcome,
            Err(e) => {
                self.lock_videos().remove(&video_id);
                return Err(e.into());
            }
        };
        let job_id = outcome.job_id().clone();

        info!(
            "Accepted upload {} from user {} on the {} plan (job {})",
            video_id, request.user_id, plan, job_id
        );
        Ok(UploadReceipt {
            video_id,
            job_id,
            plan,
        })
    }

    /// Intake finished: the media URL is resolved, start transcription.
    pub(crate) fn on_media_ready(
        &self,
        video_id: &VideoId,
        media_url: String,
    ) -> PipelineResult<()> {
        let (plan, language) = {
            let mut videos = self.lock_videos();
            let state = videos
                .get_mut(video_id)
                .ok_or_else(|| PipelineError::UnknownVideo(video_id.clone()))?;
            state.media_url = Some(media_url.clone());
            state.status = VideoStatus::Transcribing;
            (state.plan, state.language.clone())
        };

        let mut job = TranscriptionJob::new(video_id.clone(), media_url);
        if let Some(language) = language {
            job = job.with_language(language);
        }
        self.dispatcher
            .enqueue(JobPayload::Transcription(job), priority_of(plan))?;
        debug!("Transcription queued for {}", video_id);
        Ok(())
    }

    /// Transcription finished: carry the transcript into analysis.
    pub(crate) fn on_transcribed(
        &self,
        video_id: &VideoId,
        transcript: VideoTranscript,
    ) -> PipelineResult<()> {
        let (plan, media_url, duration_secs) = {
            let mut videos = self.lock_videos();
            let state = videos
                .get_mut(video_id)
                .ok_or_else(|| PipelineError::UnknownVideo(video_id.clone()))?;
            let media_url = state
                .media_url
                .clone()
                .ok_or_else(|| PipelineError::MediaUnresolved(video_id.clone()))?;
            state.status = VideoStatus::Analyzing;
            (state.plan, media_url, state.duration_secs)
        };

        let job = AnalysisJob::new(video_id.clone(), transcript, media_url, duration_secs as f64);
        self.dispatcher
            .enqueue(JobPayload::Analysis(job), priority_of(plan))?;
        debug!("Analysis queued for {}", video_id);
        Ok(())
    }

    /// Analysis finished: select segments and fan out clip jobs.
    ///
    /// A video whose analysis yields no selectable segments completes
    /// immediately with an empty clip list.
    pub(crate) fn on_analyzed(
        &self,
        video_id: &VideoId,
        analysis: ViralityAnalysis,
    ) -> PipelineResult<()> {
        let (plan, user_id, media_url, settings, threshold) = {
            let mut videos = self.lock_videos();
            let state = videos
                .get_mut(video_id)
                .ok_or_else(|| PipelineError::UnknownVideo(video_id.clone()))?;
            let media_url = state
                .media_url
                .clone()
                .ok_or_else(|| PipelineError::MediaUnresolved(video_id.clone()))?;
            state.analysis = Some(analysis.clone());
            state.status = VideoStatus::GeneratingClips;
            (
                state.plan,
                state.user_id.clone(),
                media_url,
                state.settings.clone(),
                state.publish_threshold,
            )
        };

        let limits = PlanLimits::for_plan(plan);
        let picked = select_segments(&analysis, threshold, limits.max_clips_per_video);

        if picked.is_empty() {
            {
                let mut videos = self.lock_videos();
                if let Some(state) = videos.get_mut(video_id) {
                    state.status = VideoStatus::Completed;
                }
            }
            info!("No segments selected for {}, finishing without clips", video_id);
            return Ok(());
        }

        {
            let mut videos = self.lock_videos();
            if let Some(state) = videos.get_mut(video_id) {
                state.expected_clips = picked.len();
            }
        }

        for (index, segment) in picked.iter().enumerate() {
            let clip_id = ClipId::for_segment(video_id, index);
            let job = ClipGenerationJob::new(
                clip_id,
                video_id.clone(),
                user_id.clone(),
                plan,
                media_url.clone(),
                segment.start_time,
                segment.end_time,
            )
            .with_settings(settings.clone());
            self.dispatcher
                .enqueue(JobPayload::ClipGeneration(job), priority_of(plan))?;
        }
        info!("Queued {} clip jobs for {}", picked.len(), video_id);
        Ok(())
    }

    /// One clip rendered; the video completes once every clip job settles.
    pub(crate) fn on_clip_rendered(
        &self,
        video_id: &VideoId,
        clip: RenderedClip,
    ) -> PipelineResult<()> {
        let finished = {
            let mut videos = self.lock_videos();
            let state = videos
                .get_mut(video_id)
                .ok_or_else(|| PipelineError::UnknownVideo(video_id.clone()))?;
            state.clips.push(clip);
            state.settled_clips += 1;
            if state.settled_clips >= state.expected_clips {
                state.status = VideoStatus::Completed;
                Some(state.clips.len())
            } else {
                None
            }
        };

        if let Some(count) = finished {
            info!("Video {} completed with {} clips", video_id, count);
        }
        Ok(())
    }

    /// One clip job failed terminally. The video still completes if any
    /// sibling clip rendered; it fails only when every clip job failed.
    pub(crate) fn on_clip_failed(&self, video_id: &VideoId, clip_id: &ClipId, error: &str) {
        let ended = {
            let mut videos = self.lock_videos();
            let Some(state) = videos.get_mut(video_id) else {
                return;
            };
            state.settled_clips += 1;
            if state.settled_clips >= state.expected_clips {
                if state.clips.is_empty() {
                    state.status = VideoStatus::Failed;
                    state.error = Some(format!("all clip jobs failed, last: {}", error));
                } else {
                    state.status = VideoStatus::Completed;
                }
                Some(state.status)
            } else {
                None
            }
        };

        warn!("Clip {} failed for {}: {}", clip_id, video_id, error);
        match ended {
            Some(VideoStatus::Completed) => {
                info!("Video {} completed with missing clips", video_id);
            }
            Some(VideoStatus::Failed) => {
                warn!("Video {} failed: every clip job failed", video_id);
            }
            _ => {}
        }
    }

    /// A non-clip stage failed terminally; the video fails and nothing
    /// downstream is submitted.
    pub(crate) fn on_stage_failed(&self, video_id: &VideoId, stage: &'static str, error: &str) {
        let marked = {
            let mut videos = self.lock_videos();
            match videos.get_mut(video_id) {
                Some(state) if !state.status.is_terminal() => {
                    state.status = VideoStatus::Failed;
                    state.error = Some(error.to_string());
                    true
                }
                _ => false,
            }
        };

        if marked {
            warn!(video_id = %video_id, stage = %stage, "Pipeline failed: {}", error);
        }
    }

    /// Point-in-time view of a tracked video.
    pub fn video_status(&self, video_id: &VideoId) -> Option<VideoState> {
        self.lock_videos().get(video_id).cloned()
    }

    /// Point-in-time view of a dispatched job.
    pub fn job_status(&self, job_id: &JobId) -> Option<JobSnapshot> {
        self.dispatcher.status(job_id)
    }

    /// Counters for one stage queue.
    pub fn queue_stats(&self, queue: QueueName) -> QueueStats {
        self.dispatcher.stats(queue)
    }
}
