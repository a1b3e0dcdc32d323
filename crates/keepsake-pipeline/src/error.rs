//! Pipeline error types.

use keepsake_models::PipelineStage;
use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that can end a generation run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Precondition failed: no photos, or no photo has a description yet.
    /// Distinct from a stage failure; the user simply has nothing to render.
    #[error("Nothing to generate: no described photos in the store")]
    NothingToGenerate,

    #[error("Pipeline stage '{stage}' failed: {message}")]
    StageFailed {
        stage: PipelineStage,
        message: String,
    },

    #[error("Generation run cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn stage_failed(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self::StageFailed {
            stage,
            message: message.into(),
        }
    }
}
