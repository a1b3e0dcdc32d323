//! Photo metadata, feelings, and store statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single piece of user narration attached to a photo.
///
/// Feelings are append-only: once stored they are never edited, removed,
/// or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feeling {
    /// Free-text narration from the user
    pub text: String,
    /// When the feeling was recorded
    pub timestamp: DateTime<Utc>,
    /// Optional user identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Feeling {
    pub fn new(text: impl Into<String>, user_id: Option<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
            user_id,
        }
    }
}

/// Image-free view of a stored photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoSummary {
    /// Stable name assigned at first sight (`image_0`, `image_1`, ...)
    pub name: String,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
    /// Source format of the upload, when it could be determined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Dedup hash (SHA-256 of the canonical PNG re-encode)
    pub hash: String,
    /// Original upload reference (object key)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
    /// When the photo entered the store
    pub created_at: DateTime<Utc>,
    /// Number of feelings recorded so far
    pub feeling_count: usize,
    /// Whether an analysis description has been recorded
    pub described: bool,
}

/// Aggregate counters for the photo store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_photos: usize,
    pub total_feelings: usize,
    pub queue_length: usize,
    pub unique_hashes: usize,
}
