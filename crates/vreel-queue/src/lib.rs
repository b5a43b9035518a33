//! In-process job dispatch for the clip pipeline.
//!
//! Features:
//! - Two priority queues: `video-processing` and `clip-generation`
//! - Deduplication by idempotency key while a job is pending
//! - Exponential backoff retries with per-queue policies
//! - Bounded retention of finished jobs for status queries

pub mod dispatcher;
pub mod error;
pub mod job;
pub mod metrics;
pub mod retry;

pub use dispatcher::{
    Dispatcher, EnqueueOutcome, JobOutcome, JobSnapshot, LeasedJob, OutcomeAck, QueueStats,
    COMPLETED_RETENTION, FAILED_RETENTION,
};
pub use error::{QueueError, QueueResult};
pub use job::{
    AnalysisJob, ClipGenerationJob, JobPayload, QueueName, TranscriptionJob, VideoProcessingJob,
};
pub use retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
