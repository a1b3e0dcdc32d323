//! Vision error types.

use thiserror::Error;

/// Result type for vision operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors that can occur when calling the external vision model.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Failed to configure vision client: {0}")]
    ConfigError(String),

    #[error("Model request failed: {0}")]
    ModelFailed(String),

    #[error("Model returned no usable content")]
    EmptyResponse,

    #[error("Failed to encode prompt image: {0}")]
    ImageEncode(#[from] image::ImageError),
}

impl VisionError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn model_failed(msg: impl Into<String>) -> Self {
        Self::ModelFailed(msg.into())
    }
}
