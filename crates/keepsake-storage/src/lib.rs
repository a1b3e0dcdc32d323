//! Object storage for finished videos.
//!
//! The [`ObjectStore`] trait is the seam between the pipeline and the
//! storage backend: [`S3Client`] in production, [`MemoryObjectStore`]
//! in tests.

use std::time::Duration;

use async_trait::async_trait;

pub mod client;
pub mod error;
pub mod memory;

pub use client::{S3Client, S3Config};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryObjectStore;

/// Abstract object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under a key.
    async fn put(&self, data: Vec<u8>, key: &str, content_type: &str) -> StorageResult<()>;

    /// Fetch the bytes stored under a key.
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// A time-limited URL for downloading the object.
    async fn presigned_url(&self, key: &str, ttl: Duration) -> StorageResult<String>;
}
