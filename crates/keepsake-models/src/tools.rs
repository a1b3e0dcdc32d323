//! Structured replies for the conversational tool contract.
//!
//! Each tool call from the conversational layer receives exactly one of
//! these replies. Failure variants carry reasons for the orchestration
//! layer to translate into warm, in-character speech; raw technical error
//! text never appears in user-facing fields.

use serde::{Deserialize, Serialize};

use crate::progress::{PipelineStage, RequestId};

/// Reply to the upload-ingestion entrypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestReply {
    /// Bytes hashed to new content; a photo was created and enqueued.
    Stored { photo_name: String },
    /// Bytes hashed to an already-known photo; nothing was enqueued.
    Duplicate { photo_name: String },
    /// The storage reference could not be fetched or decoded.
    Failed,
}

/// Reply to `get_photo_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NextPhotoReply {
    /// Head of the review queue.
    Photo { photo_name: String },
    /// Queue is empty. A normal terminal state, not an error.
    QueueEmpty,
}

/// Reply to `analyze_photo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalyzeReply {
    Analyzed {
        photo_name: String,
        description: String,
    },
    NotFound {
        photo_name: String,
    },
}

/// Reply to `store_user_feelings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FeelingsReply {
    Stored { photo_name: String },
    NotFound { photo_name: String },
}

/// Reply to `generate_video`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerateReply {
    /// The run finished; `video_url` is a time-bounded retrieval URL.
    Completed {
        request_id: RequestId,
        video_url: String,
    },
    /// Precondition failed: no photos or no stored descriptions yet.
    NothingToGenerate,
    /// A pipeline stage failed after the precondition passed.
    Failed {
        request_id: RequestId,
        stage: PipelineStage,
    },
    /// The session ended while the run was in flight.
    Cancelled { request_id: RequestId },
}
