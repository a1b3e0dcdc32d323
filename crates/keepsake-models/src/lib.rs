//! Shared data models for the Keepsake memory-video core.
//!
//! This crate provides Serde-serializable types for:
//! - Photos, feelings, and store statistics
//! - Storyboard scenes and emotional tones
//! - Pipeline progress events and run outcomes
//! - Structured replies for the conversational tool contract

pub mod photo;
pub mod progress;
pub mod scene;
pub mod tools;

// Re-export common types
pub use photo::{Feeling, PhotoSummary, StoreStats};
pub use progress::{PipelineStage, ProgressEvent, RequestId};
pub use scene::{Scene, Tone};
pub use tools::{AnalyzeReply, FeelingsReply, GenerateReply, IngestReply, NextPhotoReply};
