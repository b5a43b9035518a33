//! Dispatcher metrics collection.
//!
//! Provides standardized metrics for monitoring queue behavior:
//! - Enqueue and dedup counters by queue and stage
//! - Outcome counters by queue and stage
//! - Job duration histograms

use metrics::{counter, histogram};

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Total jobs accepted, by queue and stage.
    pub const JOBS_ENQUEUED_TOTAL: &str = "queue_jobs_enqueued_total";

    /// Total enqueues coalesced onto an already pending job.
    pub const JOBS_DEDUPLICATED_TOTAL: &str = "queue_jobs_deduplicated_total";

    /// Total jobs completed, by queue and stage.
    pub const JOBS_COMPLETED_TOTAL: &str = "queue_jobs_completed_total";

    /// Total jobs failed with no retries left, by queue and stage.
    pub const JOBS_FAILED_TOTAL: &str = "queue_jobs_failed_total";

    /// Total retries scheduled, by queue and stage.
    pub const JOBS_RETRIED_TOTAL: &str = "queue_jobs_retried_total";

    /// Time from enqueue to completion in seconds, by queue and stage.
    pub const JOB_DURATION_SECONDS: &str = "queue_job_duration_seconds";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record an accepted enqueue.
pub fn record_enqueued(queue: &str, stage: &str) {
    counter!(
        names::JOBS_ENQUEUED_TOTAL,
        "queue" => queue.to_string(),
        "stage" => stage.to_string()
    )
    .increment(1);
}

/// Record an enqueue that coalesced onto a pending job.
pub fn record_deduplicated(queue: &str, stage: &str) {
    counter!(
        names::JOBS_DEDUPLICATED_TOTAL,
        "queue" => queue.to_string(),
        "stage" => stage.to_string()
    )
    .increment(1);
}

/// Record a completed job and its enqueue-to-completion latency.
pub fn record_completed(queue: &str, stage: &str, duration_secs: f64) {
    counter!(
        names::JOBS_COMPLETED_TOTAL,
        "queue" => queue.to_string(),
        "stage" => stage.to_string()
    )
    .increment(1);

    histogram!(
        names::JOB_DURATION_SECONDS,
        "queue" => queue.to_string(),
        "stage" => stage.to_string()
    )
    .record(duration_secs);
}

/// Record a terminal failure.
pub fn record_failed(queue: &str, stage: &str) {
    counter!(
        names::JOBS_FAILED_TOTAL,
        "queue" => queue.to_string(),
        "stage" => stage.to_string()
    )
    .increment(1);
}

/// Record a scheduled retry.
pub fn record_retry(queue: &str, stage: &str) {
    counter!(
        names::JOBS_RETRIED_TOTAL,
        "queue" => queue.to_string(),
        "stage" => stage.to_string()
    )
    .increment(1);
}

// =============================================================================
// Tests
// =============================================================================
