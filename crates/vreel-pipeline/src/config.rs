//! Pipeline configuration.

use std::time::Duration;

/// Tunables for the pipeline and its worker pool.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Concurrent job permits shared by both stage queues.
    pub worker_concurrency: usize,
    /// Deadline for a single stage execution.
    pub job_timeout: Duration,
    /// How long shutdown waits for in-flight jobs before giving up.
    pub shutdown_timeout: Duration,
    /// Minimum segment score required to cut a clip. Zero disables the
    /// floor; individual uploads may override it.
    pub publish_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_concurrency: 4,
            job_timeout: Duration::from_secs(600),
            shutdown_timeout: Duration::from_secs(30),
            publish_threshold: 0.0,
        }
    }
}

impl PipelineConfig {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            worker_concurrency: std::env::var("WORKER_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.worker_concurrency),
            job_timeout: Duration::from_secs(
                std::env::var("JOB_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.job_timeout.as_secs()),
            ),
            shutdown_timeout: Duration::from_secs(
                std::env::var("SHUTDOWN_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.shutdown_timeout.as_secs()),
            ),
            publish_threshold: std::env::var("PUBLISH_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.publish_threshold),
        }
    }

    pub fn with_worker_concurrency(mut self, workers: usize) -> Self {
        self.worker_concurrency = workers;
        self
    }

    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = timeout;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn with_publish_threshold(mut self, threshold: f64) -> Self {
        self.publish_threshold = threshold;
        self
    }
}
