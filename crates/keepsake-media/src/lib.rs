//! Frame rasterization and video encoding.
//!
//! This crate renders one still frame per caption (letterboxed photo plus a
//! lower-third caption band) and assembles the frames into an encoded video
//! through an FFmpeg subprocess with bounded runtime.

pub mod encoder;
pub mod error;
pub mod frame;

pub use encoder::{check_ffmpeg, EncoderRunner, SlideEntry, SlideshowPlan};
pub use error::{MediaError, MediaResult};
pub use frame::{FrameRenderer, RenderConfig};
