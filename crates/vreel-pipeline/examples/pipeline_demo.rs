//! Demo: drive one upload through the whole pipeline in-process.
//!
//! Run with: cargo run -p vreel-pipeline --example pipeline_demo
//!
//! All providers are stubs with small artificial latencies, so the demo
//! exercises the real dispatcher, worker pool and stage sequencing
//! without any network credentials.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vreel_analysis::ViralityAnalyzer;
use vreel_models::{ClipId, Plan, PlanUsage, TranscriptSegment, VideoId, VideoTranscript};
use vreel_pipeline::{Pipeline, PipelineConfig, ProcessingContext, UploadRequest, WorkerPool};
use vreel_providers::{
    ClipCut, ClipRenderer, PlanStore, ProviderResult, RenderedClip, StorageLocator,
    TextAnalysisProvider, TranscriptionProvider,
};
use vreel_queue::QueueName;

struct DemoPlans;

#[async_trait]
impl PlanStore for DemoPlans {
    async fn plan_for(&self, _user_id: &str) -> ProviderResult<Plan> {
        Ok(Plan::Creator)
    }

    async fn usage_for(&self, _user_id: &str) -> ProviderResult<PlanUsage> {
        Ok(PlanUsage::new(3))
    }
}

struct DemoStorage;

#[async_trait]
impl StorageLocator for DemoStorage {
    async fn media_url(&self, video_id: &VideoId) -> ProviderResult<String> {
        Ok(format!("https://media.demo.local/videos/{}.mp4", video_id))
    }

    async fn clip_url(&self, clip_id: &ClipId) -> ProviderResult<String> {
        Ok(format!("https://media.demo.local/clips/{}.mp4", clip_id))
    }
}

struct DemoTranscriber;

#[async_trait]
impl TranscriptionProvider for DemoTranscriber {
    async fn transcribe(
        &self,
        _media_url: &str,
        language_hint: Option<&str>,
    ) -> ProviderResult<VideoTranscript> {
        tokio::time::sleep(Duration::from_millis(150)).await;
        Ok(VideoTranscript::from_segments(
            language_hint.unwrap_or("en"),
            vec![
                TranscriptSegment {
                    text: "Welcome back, today changes everything.".to_string(),
                    start: 0.0,
                    end: 4.5,
                    words: Vec::new(),
                },
                TranscriptSegment {
                    text: "Here is the one feature nobody saw coming.".to_string(),
                    start: 5.0,
                    end: 9.5,
                    words: Vec::new(),
                },
                TranscriptSegment {
                    text: "And this is how you turn it on.".to_string(),
                    start: 10.0,
                    end: 14.0,
                    words: Vec::new(),
                },
            ],
        ))
    }
}

struct DemoAnalysis;

#[async_trait]
impl TextAnalysisProvider for DemoAnalysis {
    async fn analyze(&self, _prompt: &str) -> ProviderResult<String> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(r#"{
            "overallScore": 78,
            "segments": [
                {
                    "startTime": 12, "endTime": 42, "score": 91,
                    "reasons": ["strong hook", "clear payoff"],
                    "signals": [], "suggestedClipDuration": 30
                },
                {
                    "startTime": 75, "endTime": 105, "score": 84,
                    "reasons": ["surprise reveal"],
                    "signals": [], "suggestedClipDuration": 30
                },
                {
                    "startTime": 150, "endTime": 180, "score": 62,
                    "reasons": ["practical walkthrough"],
                    "signals": [], "suggestedClipDuration": 30
                }
            ],
            "recommendations": {
                "bestMoments": [{"start": 12, "end": 42}],
                "suggestedHooks": ["Open on the reveal"],
                "platformOptimizations": {
                    "tiktok": ["Cut to the hook immediately"],
                    "instagram": ["Add subtitles for silent viewing"],
                    "youtube": ["Front-load the payoff"]
                }
            }
        }"#
        .to_string())
    }
}

struct DemoRenderer;

#[async_trait]
impl ClipRenderer for DemoRenderer {
    async fn render(&self, cut: &ClipCut) -> ProviderResult<RenderedClip> {
        tokio::time::sleep(Duration::from_millis(250)).await;
        Ok(RenderedClip {
            clip_id: cut.clip_id.clone(),
            url: format!("https://media.demo.local/clips/{}.mp4", cut.clip_id),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }

    let config = PipelineConfig::from_env();
    info!("Pipeline config: {:?}", config);

    let pipeline = Pipeline::new(config, Arc::new(DemoPlans));
    let ctx = ProcessingContext {
        storage: Arc::new(DemoStorage),
        transcriber: Arc::new(DemoTranscriber),
        analyzer: ViralityAnalyzer::new(Arc::new(DemoAnalysis)),
        renderer: Arc::new(DemoRenderer),
    };
    let pool = WorkerPool::new(pipeline.clone(), ctx);
    let runner = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.run().await })
    };

    let request = UploadRequest::new("demo-user", "launch_keynote.mp4", 250 * 1024 * 1024, 240)
        .with_language("en");
    let receipt = pipeline.submit_upload(request).await?;
    info!(
        "Submitted video {} as job {} on the {} plan",
        receipt.video_id, receipt.job_id, receipt.plan
    );

    loop {
        match pipeline.video_status(&receipt.video_id) {
            Some(state) if state.status.is_terminal() => break,
            Some(state) => info!("Video {} is {}", receipt.video_id, state.status),
            None => break,
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    let state = pipeline
        .video_status(&receipt.video_id)
        .expect("video state is tracked");

    println!("\n{}", "=".repeat(60));
    println!("FINAL VIDEO STATE");
    println!("{}", "=".repeat(60));
    println!("{}", serde_json::to_string_pretty(&state)?);

    println!("\n{}", "=".repeat(60));
    println!("QUEUE COUNTERS");
    println!("{}", "=".repeat(60));
    for queue in [QueueName::VideoProcessing, QueueName::ClipGeneration] {
        let stats = pipeline.queue_stats(queue);
        println!("{}: {}", queue, serde_json::to_string(&stats)?);
    }

    pool.shutdown();
    runner.await?;
    info!("Demo shutdown complete");
    Ok(())
}
