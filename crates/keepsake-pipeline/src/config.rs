//! Pipeline configuration.

use std::time::Duration;

/// Settings for a generation run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Fade-in/fade-out duration in seconds
    pub fade_secs: f64,
    /// Output frame rate
    pub fps: u32,
    /// Hard timeout for the encode subprocess
    pub encode_timeout_secs: u64,
    /// Lifetime of the presigned video URL
    pub presign_ttl: Duration,
    /// Key prefix for uploaded videos
    pub video_prefix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fade_secs: 0.5,
            fps: 30,
            encode_timeout_secs: 120,
            presign_ttl: Duration::from_secs(7200),
            video_prefix: "memory-videos".to_string(),
        }
    }
}
