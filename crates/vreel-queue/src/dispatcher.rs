//! In-process job dispatcher.
//!
//! Two priority queues feed the worker pool. Jobs deduplicate by
//! idempotency key while pending, dispatch by plan priority with FIFO
//! order inside a priority band, and retry with exponential backoff.
//! Finished jobs are retained in bounded windows for status queries.

use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use vreel_models::{JobId, JobState, Priority};

use crate::error::{QueueError, QueueResult};
use crate::job::{JobPayload, QueueName};
use crate::metrics;
use crate::retry::RetryPolicy;

/// Completed jobs kept around for status queries, per queue.
pub const COMPLETED_RETENTION: usize = 100;

/// Failed jobs kept around for status queries, per queue.
pub const FAILED_RETENTION: usize = 50;

/// Outcome reported by a worker for a leased job.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    /// The job finished successfully.
    Success,
    /// The job failed. Retryable failures go back on the queue with
    /// backoff until attempts run out; permanent failures do not.
    Failure { error: String, retryable: bool },
}

impl JobOutcome {
    /// Retryable failure from any displayable error.
    pub fn retryable_failure(error: impl std::fmt::Display) -> Self {
        Self::Failure {
            error: error.to_string(),
            retryable: true,
        }
    }

    /// Permanent failure from any displayable error.
    pub fn permanent_failure(error: impl std::fmt::Display) -> Self {
        Self::Failure {
            error: error.to_string(),
            retryable: false,
        }
    }
}

/// Result of an enqueue call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// A new job was accepted.
    Accepted(JobId),
    /// A job with the same idempotency key is already pending; its ID is
    /// returned and no new job is created.
    AlreadyPending(JobId),
}

impl EnqueueOutcome {
    pub fn job_id(&self) -> &JobId {
        match self {
            EnqueueOutcome::Accepted(id) => id,
            EnqueueOutcome::AlreadyPending(id) => id,
        }
    }

    /// Returns true if the enqueue coalesced onto an existing job.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, EnqueueOutcome::AlreadyPending(_))
    }
}

/// How the dispatcher disposed of a reported outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeAck {
    /// Terminal success; the record moved into the completed window.
    Completed,
    /// The failure was retryable and a backoff timer is now pending.
    RetryScheduled,
    /// Terminal failure; no further attempts will be made.
    Failed,
}

/// A job leased to exactly one worker.
#[derive(Debug, Clone)]
pub struct LeasedJob {
    /// Job ID
    pub job_id: JobId,
    /// Payload to execute
    pub payload: JobPayload,
    /// 1-based attempt number of this lease
    pub attempt: u32,
}

/// Point-in-time view of a single job.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    /// Job ID
    pub job_id: JobId,
    /// Current state
    pub state: JobState,
    /// Stage label
    pub stage: &'static str,
    /// Attempts started so far
    pub attempts: u32,
    /// Worker-reported progress, 0-100
    pub progress: u8,
    /// Most recent error, if any
    pub last_error: Option<String>,
    /// When the job was enqueued
    pub created_at: DateTime<Utc>,
    /// When the job last changed
    pub updated_at: DateTime<Utc>,
}

/// Point-in-time counters for one queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Jobs waiting to run, including those in retry backoff
    pub waiting: usize,
    /// Jobs currently leased to workers
    pub active: usize,
    /// Finished jobs still retained
    pub completed: usize,
    /// Terminally failed jobs still retained
    pub failed: usize,
    /// Sum of the above
    pub total: usize,
}

/// In-process dispatcher covering both processing queues.
///
/// Cloning is cheap; clones share the same queues. All methods are safe
/// to call concurrently. Retry timers are spawned on the ambient Tokio
/// runtime, so the dispatcher must live inside one.
#[derive(Clone)]
pub struct Dispatcher {
    video_processing: Arc<QueueState>,
    clip_generation: Arc<QueueState>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Create a dispatcher with the standard per-queue retry policies.
    pub fn new() -> Self {
        Self::with_policies(
            RetryPolicy::video_processing(),
            RetryPolicy::clip_generation(),
        )
    }

    /// Create a dispatcher with custom retry policies.
    pub fn with_policies(video_processing: RetryPolicy, clip_generation: RetryPolicy) -> Self {
        Self {
            video_processing: Arc::new(QueueState::new(
                QueueName::VideoProcessing,
                video_processing,
            )),
            clip_generation: Arc::new(QueueState::new(QueueName::ClipGeneration, clip_generation)),
        }
    }

    fn queue(&self, name: QueueName) -> &Arc<QueueState> {
        match name {
            QueueName::VideoProcessing => &self.video_processing,
            QueueName::ClipGeneration => &self.clip_generation,
        }
    }

    /// Enqueue a payload at the given priority.
    ///
    /// If a job with the same idempotency key is already pending, no new
    /// job is created and the existing job's ID is returned.
    pub fn enqueue(&self, payload: JobPayload, priority: Priority) -> QueueResult<EnqueueOutcome> {
        let queue = self.queue(payload.queue());
        let stage = payload.stage();
        let key = payload.idempotency_key();

        let accepted = {
            let mut core = queue.lock_core();
            if core.draining {
                return Err(QueueError::Draining(queue.name));
            }
            if let Some(existing) = core.dedup.get(&key) {
                EnqueueOutcome::AlreadyPending(existing.clone())
            } else {
                let id = JobId::new();
                let now = Utc::now();
                core.records.insert(
                    id.clone(),
                    JobRecord {
                        payload,
                        priority,
                        state: JobState::Queued,
                        attempts: 0,
                        progress: 0,
                        in_backoff: false,
                        last_error: None,
                        created_at: now,
                        updated_at: now,
                    },
                );
                core.dedup.insert(key.clone(), id.clone());
                core.push_ready(priority, id.clone());
                EnqueueOutcome::Accepted(id)
            }
        };

        match &accepted {
            EnqueueOutcome::Accepted(id) => {
                queue.ready_permits.add_permits(1);
                info!(
                    "Enqueued {} job {} on {} (priority {})",
                    stage, id, queue.name, priority
                );
                metrics::record_enqueued(queue.name.as_str(), stage);
            }
            EnqueueOutcome::AlreadyPending(id) => {
                debug!("Enqueue coalesced onto pending job {} ({})", id, key);
                metrics::record_deduplicated(queue.name.as_str(), stage);
            }
        }
        Ok(accepted)
    }

    /// Lease the next job from a queue, waiting until one is ready.
    ///
    /// Returns `None` once the queue has been drained, after which no
    /// further jobs will ever arrive.
    pub async fn next_job(&self, queue: QueueName) -> Option<LeasedJob> {
        let queue = Arc::clone(self.queue(queue));
        loop {
            match queue.ready_permits.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => return None, // closed by drain
            }

            let leased = {
                let mut core = queue.lock_core();
                core.lease_next()
            };
            if let Some(lease) = leased {
                debug!(
                    "Leased job {} from {} (attempt {})",
                    lease.job_id, queue.name, lease.attempt
                );
                return Some(lease);
            }
        }
    }

    /// Report the outcome of a leased job.
    ///
    /// Success and exhausted or permanent failures are terminal: the job's
    /// idempotency key is released and the record moves into the retention
    /// window. Retryable failures re-queue the job after its backoff. The
    /// returned ack tells the caller which of those happened.
    pub fn report_outcome(&self, job_id: &JobId, outcome: JobOutcome) -> QueueResult<OutcomeAck> {
        if let Some(ack) = self.video_processing.settle(job_id, &outcome)? {
            return Ok(ack);
        }
        if let Some(ack) = self.clip_generation.settle(job_id, &outcome)? {
            return Ok(ack);
        }
        Err(QueueError::job_not_found(job_id))
    }

    /// Record worker-reported progress for an active job, clamped to 0-100.
    pub fn report_progress(&self, job_id: &JobId, progress: u8) -> QueueResult<()> {
        if self.video_processing.progress(job_id, progress)? {
            return Ok(());
        }
        if self.clip_generation.progress(job_id, progress)? {
            return Ok(());
        }
        Err(QueueError::job_not_found(job_id))
    }

    /// Point-in-time view of a job, if it is pending or still retained.
    pub fn status(&self, job_id: &JobId) -> Option<JobSnapshot> {
        self.video_processing
            .snapshot(job_id)
            .or_else(|| self.clip_generation.snapshot(job_id))
    }

    /// Counters for one queue.
    pub fn stats(&self, queue: QueueName) -> QueueStats {
        self.queue(queue).stats()
    }

    /// Stop intake and discard all waiting jobs on both queues.
    ///
    /// Active jobs keep running and may still report outcomes; retries
    /// sitting in backoff are cancelled. Returns the number of discarded
    /// jobs.
    pub fn drain(&self) -> usize {
        self.video_processing.drain() + self.clip_generation.drain()
    }
}

struct QueueState {
    name: QueueName,
    policy: RetryPolicy,
    core: Mutex<QueueCore>,
    /// One permit per entry in the ready heap.
    ready_permits: Semaphore,
}

impl QueueState {
    fn new(name: QueueName, policy: RetryPolicy) -> Self {
        Self {
            name,
            policy,
            core: Mutex::new(QueueCore::default()),
            ready_permits: Semaphore::new(0),
        }
    }

    fn lock_core(&self) -> MutexGuard<'_, QueueCore> {
        // Recover the guard on poison; core mutations never leave partial state.
        self.core.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply a worker-reported outcome. `Ok(None)` when the job is not
    /// in this queue, so the dispatcher can try the other one.
    fn settle(
        self: &Arc<Self>,
        job_id: &JobId,
        outcome: &JobOutcome,
    ) -> QueueResult<Option<OutcomeAck>> {
        let settled = {
            let mut core = self.lock_core();
            let draining = core.draining;
            let Some(record) = core.records.get_mut(job_id) else {
                return Ok(None);
            };
            if record.state != JobState::Active {
                return Err(QueueError::NotActive {
                    id: job_id.clone(),
                    state: record.state,
                });
            }

            let now = Utc::now();
            let stage = record.payload.stage();
            let key = record.payload.idempotency_key();
            let attempt = record.attempts;

            match outcome {
                JobOutcome::Success => {
                    record.state = JobState::Completed;
                    record.progress = 100;
                    record.updated_at = now;
                    let elapsed_secs =
                        (now - record.created_at).num_milliseconds().max(0) as f64 / 1000.0;
                    core.dedup.remove(&key);
                    core.completed.push_back(job_id.clone());
                    if core.completed.len() > COMPLETED_RETENTION {
                        if let Some(evicted) = core.completed.pop_front() {
                            core.records.remove(&evicted);
                        }
                    }
                    Settled::Completed {
                        stage,
                        elapsed_secs,
                    }
                }
                JobOutcome::Failure { error, retryable } => {
                    record.last_error = Some(error.clone());
                    record.updated_at = now;
                    if *retryable && !draining && self.policy.should_retry(attempt) {
                        record.state = JobState::Queued;
                        record.in_backoff = true;
                        Settled::RetryScheduled {
                            stage,
                            attempt,
                            delay: self.policy.delay_for_attempt(attempt),
                            error: error.clone(),
                        }
                    } else {
                        record.state = JobState::Failed;
                        core.dedup.remove(&key);
                        core.failed.push_back(job_id.clone());
                        if core.failed.len() > FAILED_RETENTION {
                            if let Some(evicted) = core.failed.pop_front() {
                                core.records.remove(&evicted);
                            }
                        }
                        Settled::Failed {
                            stage,
                            attempt,
                            error: error.clone(),
                        }
                    }
                }
            }
        };

        let ack = match settled {
            Settled::Completed {
                stage,
                elapsed_secs,
            } => {
                info!("Job {} completed in {:.1}s", job_id, elapsed_secs);
                metrics::record_completed(self.name.as_str(), stage, elapsed_secs);
                OutcomeAck::Completed
            }
            Settled::RetryScheduled {
                stage,
                attempt,
                delay,
                error,
            } => {
                warn!(
                    "Job {} attempt {} failed, retrying in {:?}: {}",
                    job_id, attempt, delay, error
                );
                metrics::record_retry(self.name.as_str(), stage);
                let queue = Arc::clone(self);
                let job_id = job_id.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    queue.requeue_after_backoff(&job_id);
                });
                OutcomeAck::RetryScheduled
            }
            Settled::Failed {
                stage,
                attempt,
                error,
            } => {
                warn!(
                    "Job {} failed permanently after {} attempts: {}",
                    job_id, attempt, error
                );
                metrics::record_failed(self.name.as_str(), stage);
                OutcomeAck::Failed
            }
        };
        Ok(Some(ack))
    }

    /// Put a job back on the ready heap once its backoff elapses.
    ///
    /// A no-op if the job was discarded by a drain in the meantime.
    fn requeue_after_backoff(&self, job_id: &JobId) {
        let requeued = {
            let mut core = self.lock_core();
            let Some(record) = core.records.get_mut(job_id) else {
                return;
            };
            if record.state != JobState::Queued || !record.in_backoff {
                return;
            }
            record.in_backoff = false;
            record.updated_at = Utc::now();
            let priority = record.priority;
            core.push_ready(priority, job_id.clone());
            true
        };
        if requeued {
            self.ready_permits.add_permits(1);
            debug!("Job {} backoff elapsed, ready again", job_id);
        }
    }

    fn progress(&self, job_id: &JobId, progress: u8) -> QueueResult<bool> {
        let mut core = self.lock_core();
        let Some(record) = core.records.get_mut(job_id) else {
            return Ok(false);
        };
        if record.state != JobState::Active {
            return Err(QueueError::NotActive {
                id: job_id.clone(),
                state: record.state,
            });
        }
        record.progress = progress.min(100);
        record.updated_at = Utc::now();
        Ok(true)
    }

    fn snapshot(&self, job_id: &JobId) -> Option<JobSnapshot> {
        let core = self.lock_core();
        core.records.get(job_id).map(|record| JobSnapshot {
            job_id: job_id.clone(),
            state: record.state,
            stage: record.payload.stage(),
            attempts: record.attempts,
            progress: record.progress,
            last_error: record.last_error.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    fn stats(&self) -> QueueStats {
        let core = self.lock_core();
        let waiting = core
            .records
            .values()
            .filter(|r| r.state == JobState::Queued)
            .count();
        let active = core
            .records
            .values()
            .filter(|r| r.state == JobState::Active)
            .count();
        let completed = core.completed.len();
        let failed = core.failed.len();
        QueueStats {
            waiting,
            active,
            completed,
            failed,
            total: waiting + active + completed + failed,
        }
    }

    fn drain(&self) -> usize {
        let discarded = {
            let mut core = self.lock_core();
            core.draining = true;
            core.ready.clear();
            let waiting: Vec<JobId> = core
                .records
                .iter()
                .filter(|(_, record)| record.state == JobState::Queued)
                .map(|(id, _)| id.clone())
                .collect();
            for id in &waiting {
                if let Some(record) = core.records.remove(id) {
                    core.dedup.remove(&record.payload.idempotency_key());
                }
            }
            waiting.len()
        };
        self.ready_permits.close();
        info!("Drained {}: discarded {} waiting jobs", self.name, discarded);
        discarded
    }
}

/// What `settle` did, carried out of the lock so logging, metrics and
/// timer spawns never run under it.
enum Settled {
    Completed {
        stage: &'static str,
        elapsed_secs: f64,
    },
    RetryScheduled {
        stage: &'static str,
        attempt: u32,
        delay: Duration,
        error: String,
    },
    Failed {
        stage: &'static str,
        attempt: u32,
        error: String,
    },
}

#[derive(Default)]
struct QueueCore {
    ready: BinaryHeap<ReadyEntry>,
    records: HashMap<JobId, JobRecord>,
    dedup: HashMap<String, JobId>,
    completed: VecDeque<JobId>,
    failed: VecDeque<JobId>,
    next_seq: u64,
    draining: bool,
}

impl QueueCore {
    fn push_ready(&mut self, priority: Priority, job_id: JobId) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.ready.push(ReadyEntry {
            priority,
            seq,
            job_id,
        });
    }

    fn lease_next(&mut self) -> Option<LeasedJob> {
        let entry = self.ready.pop()?;
        let record = self.records.get_mut(&entry.job_id)?;
        record.state = JobState::Active;
        record.attempts += 1;
        record.progress = 0;
        record.updated_at = Utc::now();
        Some(LeasedJob {
            job_id: entry.job_id,
            payload: record.payload.clone(),
            attempt: record.attempts,
        })
    }
}

struct JobRecord {
    payload: JobPayload,
    priority: Priority,
    state: JobState,
    attempts: u32,
    progress: u8,
    /// True while a retry timer is pending for this job.
    in_backoff: bool,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

struct ReadyEntry {
    priority: Priority,
    seq: u64,
    job_id: JobId,
}

impl PartialEq for ReadyEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for ReadyEntry {}

impl PartialOrd for ReadyEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReadyEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // BinaryHeap pops the max; invert so the lowest priority rank,
        // then the earliest seq, comes out first.
        other
            .priority
            .rank()
            .cmp(&self.priority.rank())
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vreel_models::{priority_of, Plan};

    fn entry(plan: Plan, seq: u64) -> ReadyEntry {
        ReadyEntry {
            priority: priority_of(plan),
            seq,
            job_id: JobId::new(),
        }
    }

    #[test]
    fn test_ready_ordering_by_priority() {
        let mut heap = BinaryHeap::new();
        heap.push(entry(Plan::Free, 0));
        heap.push(entry(Plan::Pro, 2));
        heap.push(entry(Plan::Creator, 1));

        let ranks: Vec<u8> = std::iter::from_fn(|| heap.pop())
            .map(|e| e.priority.rank())
            .collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_ready_ordering_fifo_within_priority() {
        let mut heap = BinaryHeap::new();
        heap.push(entry(Plan::Creator, 5));
        heap.push(entry(Plan::Creator, 3));
        heap.push(entry(Plan::Creator, 4));

        let seqs: Vec<u64> = std::iter::from_fn(|| heap.pop()).map(|e| e.seq).collect();
        assert_eq!(seqs, vec![3, 4, 5]);
    }
}
