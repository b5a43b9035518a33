//! The worker pool: leases stage jobs, runs providers, reports outcomes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};

use vreel_analysis::{analyze_audio_features, combine_analysis_signals, ViralityAnalyzer};
use vreel_providers::{ClipCut, ClipRenderer, StorageLocator, TranscriptionProvider};
use vreel_queue::{JobOutcome, JobPayload, LeasedJob, OutcomeAck, QueueName};

use crate::error::{PipelineError, PipelineResult};
use crate::logging::JobLogger;
use crate::orchestrator::Pipeline;

/// Provider handles the stage handlers run against.
pub struct ProcessingContext {
    pub storage: Arc<dyn StorageLocator>,
    pub transcriber: Arc<dyn TranscriptionProvider>,
    pub analyzer: ViralityAnalyzer,
    pub renderer: Arc<dyn ClipRenderer>,
}

/// Pulls jobs from both stage queues and executes them with bounded
/// concurrency. Every running job holds one permit; shutdown stops
/// intake, drains the dispatcher and waits out in-flight jobs.
#[derive(Clone)]
pub struct WorkerPool {
    pipeline: Pipeline,
    ctx: Arc<ProcessingContext>,
    permits: Arc<Semaphore>,
    shutdown: watch::Sender<bool>,
}

impl WorkerPool {
    pub fn new(pipeline: Pipeline, ctx: ProcessingContext) -> Self {
        let concurrency = pipeline.config().worker_concurrency.max(1);
        let (shutdown, _) = watch::channel(false);
        Self {
            pipeline,
            ctx: Arc::new(ctx),
            permits: Arc::new(Semaphore::new(concurrency)),
            shutdown,
        }
    }

    /// Ask the pool to stop. `run` stops claiming work, drains the
    /// dispatcher and returns once in-flight jobs settle or the shutdown
    /// window closes.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Run until shutdown is requested or both queues are drained.
    pub async fn run(&self) {
        let config = self.pipeline.config().clone();
        info!(
            "Worker pool running with {} permits over {} and {}",
            config.worker_concurrency,
            QueueName::VideoProcessing,
            QueueName::ClipGeneration
        );

        if let Err(e) = self.spawn_claim_loop().await {
            error!("Claim loop task failed: {}", e);
        }

        let discarded = self.pipeline.dispatcher().drain();
        if discarded > 0 {
            info!("Discarded {} waiting jobs at shutdown", discarded);
        }

        // All permits back means no job is still running.
        let concurrency = config.worker_concurrency.max(1) as u32;
        match tokio::time::timeout(
            config.shutdown_timeout,
            Arc::clone(&self.permits).acquire_many_owned(concurrency),
        )
        .await
        {
            Ok(Ok(_permits)) => info!("Worker pool stopped, all jobs settled"),
            Ok(Err(_)) => {}
            Err(_) => warn!(
                "Worker pool stopped with jobs still running after {:?}",
                config.shutdown_timeout
            ),
        }
    }

    /// One claim loop serves both queues: a permit is taken first, then
    /// whichever queue produces a job first gets it. The only signal ever
    /// sent on the shutdown channel is `true`, so any change means stop.
    fn spawn_claim_loop(&self) -> JoinHandle<()> {
        let pipeline = self.pipeline.clone();
        let ctx = Arc::clone(&self.ctx);
        let permits = Arc::clone(&self.permits);
        let job_timeout = pipeline.config().job_timeout;
        let mut shutdown_rx = self.shutdown.subscribe();

        tokio::spawn(async move {
            loop {
                if *shutdown_rx.borrow() {
                    break;
                }

                let permit = tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    permit = Arc::clone(&permits).acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    },
                };

                let lease = tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    Some(lease) = pipeline.dispatcher().next_job(QueueName::VideoProcessing) => lease,
                    Some(lease) = pipeline.dispatcher().next_job(QueueName::ClipGeneration) => lease,
                    // Both queues drained and closed.
                    else => break,
                };

                let pipeline = pipeline.clone();
                let ctx = Arc::clone(&ctx);
                tokio::spawn(async move {
                    let _permit = permit;
                    execute_job(&pipeline, &ctx, job_timeout, lease).await;
                });
            }
            debug!("Claim loop stopped");
        })
    }
}

/// Run one leased job under the stage deadline and report its outcome.
async fn execute_job(
    pipeline: &Pipeline,
    ctx: &Arc<ProcessingContext>,
    job_timeout: Duration,
    lease: LeasedJob,
) {
    let logger = JobLogger::new(&lease.job_id, lease.payload.stage());
    logger.started(lease.attempt);

    let handled = tokio::time::timeout(
        job_timeout,
        run_stage(pipeline, ctx, &lease).instrument(logger.span(lease.attempt)),
    )
    .await;

    let (outcome, error_text) = match handled {
        Ok(Ok(detail)) => {
            logger.completed(&detail);
            (JobOutcome::Success, None)
        }
        Ok(Err(e)) => {
            let text = e.to_string();
            let outcome = if e.is_retryable() {
                JobOutcome::retryable_failure(&text)
            } else {
                JobOutcome::permanent_failure(&text)
            };
            (outcome, Some(text))
        }
        Err(_) => {
            let text = PipelineError::StageTimeout(job_timeout).to_string();
            (JobOutcome::retryable_failure(&text), Some(text))
        }
    };

    match pipeline.dispatcher().report_outcome(&lease.job_id, outcome) {
        Ok(OutcomeAck::Failed) => {
            let error = error_text.unwrap_or_else(|| "unknown error".to_string());
            logger.failed(&error);
            match &lease.payload {
                JobPayload::ClipGeneration(job) => {
                    pipeline.on_clip_failed(&job.video_id, &job.clip_id, &error);
                }
                other => {
                    pipeline.on_stage_failed(other.video_id(), other.stage(), &error);
                }
            }
        }
        Ok(OutcomeAck::RetryScheduled) | Ok(OutcomeAck::Completed) => {}
        Err(e) => error!("Could not report outcome for job {}: {}", lease.job_id, e),
    }
}

/// Execute one stage and hand its artifact to the orchestrator.
async fn run_stage(
    pipeline: &Pipeline,
    ctx: &Arc<ProcessingContext>,
    lease: &LeasedJob,
) -> PipelineResult<String> {
    match &lease.payload {
        JobPayload::VideoProcessing(job) => {
            let media_url = ctx.storage.media_url(&job.video_id).await?;
            pipeline.on_media_ready(&job.video_id, media_url)?;
            Ok(format!("media resolved for {}", job.filename))
        }
        JobPayload::Transcription(job) => {
            let transcript = ctx
                .transcriber
                .transcribe(&job.media_url, job.language.as_deref())
                .await?;
            let detail = format!(
                "{} segments, language {}",
                transcript.segments.len(),
                transcript.language
            );
            pipeline.on_transcribed(&job.video_id, transcript)?;
            Ok(detail)
        }
        JobPayload::Analysis(job) => {
            let analysis = ctx
                .analyzer
                .analyze_transcript(&job.transcript, job.duration_secs)
                .await?;
            let audio_signals = analyze_audio_features(&job.media_url);
            let analysis = combine_analysis_signals(&analysis, &audio_signals);
            let detail = format!(
                "overall {} with {} segments",
                analysis.overall_score,
                analysis.segments.len()
            );
            pipeline.on_analyzed(&job.video_id, analysis)?;
            Ok(detail)
        }
        JobPayload::ClipGeneration(job) => {
            let cut = ClipCut {
                clip_id: job.clip_id.clone(),
                video_id: job.video_id.clone(),
                media_url: job.media_url.clone(),
                start_time: job.start_time,
                end_time: job.end_time,
                settings: job.settings.clone(),
            };
            let rendered = ctx.renderer.render(&cut).await?;
            let detail = format!("clip {} at {}", rendered.clip_id, rendered.url);
            pipeline.on_clip_rendered(&job.video_id, rendered)?;
            Ok(detail)
        }
    }
}
