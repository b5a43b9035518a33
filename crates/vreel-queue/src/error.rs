//! Queue error types.

use thiserror::Error;

use vreel_models::{JobId, JobState};

use crate::job::QueueName;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error("Job {id} is {state}, expected an active lease")]
    NotActive { id: JobId, state: JobState },

    #[error("Queue {0} is draining and no longer accepts jobs")]
    Draining(QueueName),
}

impl QueueError {
    pub fn job_not_found(id: &JobId) -> Self {
        Self::JobNotFound(id.clone())
    }
}
