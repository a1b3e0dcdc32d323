//! Vision model adapters.
//!
//! This crate wraps the external vision/caption model behind the
//! `GenerativeModel` trait and builds two components on top of it:
//! - `ImageAnalyzer`: warm, conversational photo descriptions with a fixed
//!   fallback sentence
//! - `CaptionWriter`: per-scene caption synthesis with strict parsing and
//!   deterministic fallback captions
//!
//! Both components degrade gracefully; neither can fail a generation run.

pub mod analyzer;
pub mod captions;
pub mod error;
pub mod gemini;

pub use analyzer::ImageAnalyzer;
pub use captions::CaptionWriter;
pub use error::{VisionError, VisionResult};
pub use gemini::{GeminiConfig, GeminiModel, GenerativeModel, PromptPart};
