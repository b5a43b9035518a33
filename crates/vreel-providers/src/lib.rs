//! Capability interfaces consumed by the pipeline, plus the vendor clients
//! that implement them.
//!
//! The orchestrators never talk to a vendor SDK directly; they are handed
//! trait objects (`TranscriptionProvider`, `TextAnalysisProvider`,
//! `StorageLocator`, `PlanStore`, `ClipRenderer`) so tests and embedders can
//! substitute their own implementations. `DeepgramClient` and `ClaudeClient`
//! are the shipping implementations of the two remote capabilities.

pub mod claude;
pub mod deepgram;
pub mod error;
pub mod traits;

pub use claude::{ClaudeClient, ClaudeConfig};
pub use deepgram::{DeepgramClient, DeepgramConfig};
pub use error::{ProviderError, ProviderResult};
pub use traits::{
    ClipCut, ClipRenderer, PlanStore, RenderedClip, StorageLocator, TextAnalysisProvider,
    TranscriptionProvider,
};
