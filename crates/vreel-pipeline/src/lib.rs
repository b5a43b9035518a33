//! Upload-to-clips pipeline orchestration.
//!
//! This crate provides:
//! - Submission-time plan policy enforcement
//! - The pipeline orchestrator sequencing intake, transcription, analysis
//!   and clip generation per video
//! - A worker pool executing stage jobs against injected providers
//! - Env-driven pipeline configuration

pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod policy;
pub mod worker;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::JobLogger;
pub use orchestrator::{select_segments, Pipeline, UploadReceipt, VideoState, VideoStatus};
pub use policy::{check_upload, PolicyViolation, UploadRequest};
pub use worker::{ProcessingContext, WorkerPool};
