//! Pipeline error types.

use std::time::Duration;

use thiserror::Error;

use vreel_models::VideoId;
use vreel_providers::ProviderError;
use vreel_queue::QueueError;

use crate::policy::PolicyViolation;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors surfaced by submission, stage execution and the status surface.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The upload violates the subscriber's plan limits.
    #[error("Upload rejected: {0}")]
    Policy(#[from] PolicyViolation),

    /// A provider call failed.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The dispatcher refused an operation.
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// A stage handler exceeded its deadline.
    #[error("Stage timed out after {0:?}")]
    StageTimeout(Duration),

    /// The video is not tracked by this pipeline.
    #[error("Unknown video: {0}")]
    UnknownVideo(VideoId),

    /// A stage callback arrived before the media URL was resolved.
    #[error("No media URL resolved yet for video {0}")]
    MediaUnresolved(VideoId),
}

impl PipelineError {
    /// True when retrying the same work later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Provider(e) => e.is_transient(),
            PipelineError::StageTimeout(_) => true,
            PipelineError::Policy(_)
            | PipelineError::Queue(_)
            | PipelineError::UnknownVideo(_)
            | PipelineError::MediaUnresolved(_) => false,
        }
    }
}
