//! Structured job logging.

use tracing::{error, info, info_span, Span};

use vreel_models::JobId;

/// Carries job identity so lifecycle log lines stay uniform across the
/// worker pool.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    stage: &'static str,
}

impl JobLogger {
    pub fn new(job_id: &JobId, stage: &'static str) -> Self {
        Self {
            job_id: job_id.as_str().to_string(),
            stage,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    /// Span wrapping one execution attempt.
    pub fn span(&self, attempt: u32) -> Span {
        info_span!("stage_job", job_id = %self.job_id, stage = %self.stage, attempt)
    }

    pub fn started(&self, attempt: u32) {
        info!(job_id = %self.job_id, stage = %self.stage, attempt, "Job started");
    }

    pub fn completed(&self, detail: &str) {
        info!(job_id = %self.job_id, stage = %self.stage, "Job completed: {}", detail);
    }

    pub fn failed(&self, error: &str) {
        error!(job_id = %self.job_id, stage = %self.stage, "Job failed terminally: {}", error);
    }
}
