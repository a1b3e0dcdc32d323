//! In-memory object store for tests and local runs.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{StorageError, StorageResult};
use crate::ObjectStore;

/// Object store backed by a map. URLs it hands out use the `memory://`
/// scheme and resolve nowhere; they exist so callers can assert on them.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, StoredObject>>,
}

struct StoredObject {
    data: Vec<u8>,
    content_type: String,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.lock().await.is_empty()
    }

    /// Content type recorded for a key, if present.
    pub async fn content_type_of(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .await
            .get(key)
            .map(|o| o.content_type.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, data: Vec<u8>, key: &str, content_type: &str) -> StorageResult<()> {
        self.objects.lock().await.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.objects
            .lock()
            .await
            .get(key)
            .map(|o| o.data.clone())
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn presigned_url(&self, key: &str, ttl: Duration) -> StorageResult<String> {
        if !self.objects.lock().await.contains_key(key) {
            return Err(StorageError::not_found(key));
        }
        Ok(format!("memory://bucket/{}?ttl={}", key, ttl.as_secs()))
    }
}
