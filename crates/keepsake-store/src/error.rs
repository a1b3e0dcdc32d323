//! Store error types.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while storing photos.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to re-encode image for hashing: {0}")]
    Encode(#[from] image::ImageError),
}
