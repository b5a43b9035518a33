//! Per-queue retry policies with exponential backoff.

use std::time::Duration;

use crate::job::QueueName;

/// Default maximum attempts per job, counting the first run.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Backoff schedule for one queue.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, counting the first run.
    pub max_attempts: u32,
    /// Delay before the first retry (doubles each attempt).
    pub base_delay: Duration,
    /// Backoff multiplier applied per failed attempt.
    pub multiplier: u32,
    /// Ceiling on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_secs(5),
            multiplier: 2,
            max_delay: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    /// Policy for the video processing queue.
    pub fn video_processing() -> Self {
        Self::default()
    }

    /// Policy for the clip generation queue.
    pub fn clip_generation() -> Self {
        Self {
            base_delay: Duration::from_secs(3),
            ..Default::default()
        }
    }

    /// Policy for the given queue.
    pub fn for_queue(queue: QueueName) -> Self {
        match queue {
            QueueName::VideoProcessing => Self::video_processing(),
            QueueName::ClipGeneration => Self::clip_generation(),
        }
    }

    /// Set the base delay.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Set the maximum number of attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Whether a job whose `attempt`-th run just failed should retry.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay before re-dispatching a job whose `attempt`-th run failed.
    ///
    /// Attempts are 1-based: the first retry waits `base_delay`, the next
    /// `base_delay * multiplier`, and so on up to `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = self.multiplier.saturating_pow(exponent);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_processing_delay_schedule() {
        let policy = RetryPolicy::video_processing();
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(5));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(10));
    }

    #[test]
    fn test_clip_generation_delay_schedule() {
        let policy = RetryPolicy::clip_generation();
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(3));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(6));
    }

    #[test]
    fn test_delay_caps_at_max() {
        let policy = RetryPolicy::video_processing().with_max_attempts(10);
        // 5s * 2^7 = 640s, above the 300s ceiling.
        assert_eq!(policy.delay_for_attempt(8), Duration::from_secs(300));
    }

    #[test]
    fn test_should_retry_respects_max_attempts() {
        let policy = RetryPolicy::for_queue(QueueName::ClipGeneration);
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
        assert!(!policy.should_retry(4));
    }
}
