//! The session photo store.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageFormat};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use keepsake_models::{Feeling, PhotoSummary, StoreStats};

use crate::error::StoreResult;
use crate::hash::content_hash;

/// One stored photo. Identity and image payload are immutable after
/// creation; only the feelings list and the analysis description mutate.
#[derive(Debug, Clone)]
struct PhotoRecord {
    name: String,
    image: DynamicImage,
    format: Option<String>,
    hash: String,
    source_ref: Option<String>,
    created_at: DateTime<Utc>,
    feelings: Vec<Feeling>,
    description: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    photos: HashMap<String, PhotoRecord>,
    /// Photo names in creation order. Unlike `queue`, never consumed.
    order: Vec<String>,
    /// Review queue, consumed destructively by `pop_next_photo`.
    queue: VecDeque<String>,
    hash_to_name: HashMap<String, String>,
    counter: u64,
}

/// Content-addressed, deduplicating store of photos and user narration.
///
/// All state lives behind a single mutex; the add-photo sequence (hash
/// lookup, counter allocation, map insert, queue append) is atomic with
/// respect to every other mutation.
#[derive(Debug, Default)]
pub struct PhotoStore {
    inner: Mutex<Inner>,
}

impl PhotoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a photo, deduplicating by content hash.
    ///
    /// Returns `(name, is_new)`. A duplicate upload returns the existing
    /// name with `is_new = false` and does not re-enqueue.
    pub async fn add_photo(
        &self,
        image: DynamicImage,
        source_ref: Option<&str>,
        format: Option<ImageFormat>,
    ) -> StoreResult<(String, bool)> {
        // The re-encode is pure CPU work; only lookup and insert need the lock.
        let hash = content_hash(&image)?;

        let mut inner = self.inner.lock().await;

        if let Some(existing) = inner.hash_to_name.get(&hash) {
            info!(photo = %existing, "Duplicate photo detected, using existing");
            return Ok((existing.clone(), false));
        }

        let name = format!("image_{}", inner.counter);
        inner.counter += 1;

        let record = PhotoRecord {
            name: name.clone(),
            format: format.map(|f| format!("{:?}", f)),
            hash: hash.clone(),
            source_ref: source_ref.map(str::to_string),
            created_at: Utc::now(),
            feelings: Vec::new(),
            description: None,
            image,
        };

        let (width, height) = (record.image.width(), record.image.height());
        inner.photos.insert(name.clone(), record);
        inner.order.push(name.clone());
        inner.queue.push_back(name.clone());
        inner.hash_to_name.insert(hash, name.clone());

        info!(photo = %name, width, height, "Added new photo");
        Ok((name, true))
    }

    /// Append a feeling to a photo. Returns false if the photo is unknown.
    pub async fn add_feeling(
        &self,
        photo_name: &str,
        text: impl Into<String>,
        user_id: Option<String>,
    ) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.photos.get_mut(photo_name) {
            Some(record) => {
                record.feelings.push(Feeling::new(text, user_id));
                debug!(photo = %photo_name, "Added feeling");
                true
            }
            None => {
                warn!(photo = %photo_name, "Cannot add feeling: photo not found");
                false
            }
        }
    }

    /// Record the analysis description for a photo. Returns false if the
    /// photo is unknown. A later analysis replaces an earlier one.
    pub async fn record_description(&self, photo_name: &str, text: impl Into<String>) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.photos.get_mut(photo_name) {
            Some(record) => {
                record.description = Some(text.into());
                true
            }
            None => false,
        }
    }

    /// Pop the next photo from the review queue.
    ///
    /// `None` means the queue is empty, which is a normal outcome distinct
    /// from a missing photo.
    pub async fn pop_next_photo(&self) -> Option<String> {
        self.inner.lock().await.queue.pop_front()
    }

    /// Whether a photo with this name exists.
    pub async fn exists(&self, photo_name: &str) -> bool {
        self.inner.lock().await.photos.contains_key(photo_name)
    }

    /// Check whether an image would deduplicate against a stored photo,
    /// without storing anything. Returns the existing name if so.
    pub async fn is_duplicate(&self, image: &DynamicImage) -> StoreResult<Option<String>> {
        let hash = content_hash(image)?;
        Ok(self.inner.lock().await.hash_to_name.get(&hash).cloned())
    }

    /// Get a clone of a photo's decoded image.
    pub async fn photo_image(&self, photo_name: &str) -> Option<DynamicImage> {
        self.inner
            .lock()
            .await
            .photos
            .get(photo_name)
            .map(|r| r.image.clone())
    }

    /// Get the feelings recorded for a photo, in arrival order.
    pub async fn feelings(&self, photo_name: &str) -> Option<Vec<Feeling>> {
        self.inner
            .lock()
            .await
            .photos
            .get(photo_name)
            .map(|r| r.feelings.clone())
    }

    /// Image-free summaries of every stored photo, in creation order.
    pub async fn summaries(&self) -> Vec<PhotoSummary> {
        let inner = self.inner.lock().await;
        inner
            .order
            .iter()
            .filter_map(|name| inner.photos.get(name))
            .map(|r| PhotoSummary {
                name: r.name.clone(),
                width: r.image.width(),
                height: r.image.height(),
                format: r.format.clone(),
                hash: r.hash.clone(),
                source_ref: r.source_ref.clone(),
                created_at: r.created_at,
                feeling_count: r.feelings.len(),
                described: r.description.is_some(),
            })
            .collect()
    }

    /// The session transcript: every feeling in arrival order, joined into
    /// sentence-terminated prose for the storyboard and caption prompts.
    pub async fn transcript(&self) -> String {
        let inner = self.inner.lock().await;
        let mut parts = Vec::new();
        for name in &inner.order {
            if let Some(record) = inner.photos.get(name) {
                for feeling in &record.feelings {
                    let text = feeling.text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    if text.ends_with(['.', '!', '?']) {
                        parts.push(text.to_string());
                    } else {
                        parts.push(format!("{}.", text));
                    }
                }
            }
        }
        parts.join(" ")
    }

    /// The most recently added photo that has an analysis description.
    pub async fn latest_described_photo(&self) -> Option<(String, String)> {
        let inner = self.inner.lock().await;
        inner.order.iter().rev().find_map(|name| {
            inner
                .photos
                .get(name)
                .and_then(|r| r.description.clone().map(|d| (name.clone(), d)))
        })
    }

    /// Storage counters, consistent with the latest completed write.
    pub async fn stats(&self) -> StoreStats {
        let inner = self.inner.lock().await;
        StoreStats {
            total_photos: inner.photos.len(),
            total_feelings: inner.photos.values().map(|r| r.feelings.len()).sum(),
            queue_length: inner.queue.len(),
            unique_hashes: inner.hash_to_name.len(),
        }
    }

    /// Reset all state. Only used between sessions, never mid-generation.
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.photos.clear();
        inner.order.clear();
        inner.queue.clear();
        inner.hash_to_name.clear();
        inner.counter = 0;
        info!("Cleared photo store");
    }
}
