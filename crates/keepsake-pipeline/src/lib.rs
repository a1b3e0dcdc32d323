//! Photo-memory video generation.
//!
//! This crate ties the workspace together: the heuristic storyboard
//! builder, the video assembler, the stage-by-stage pipeline, and the
//! tool handlers the conversational layer calls.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod storyboard;
pub mod tools;
pub mod video;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use pipeline::VideoPipeline;
pub use storyboard::build_storyboard;
pub use tools::ToolHandler;
pub use video::VideoAssembler;
