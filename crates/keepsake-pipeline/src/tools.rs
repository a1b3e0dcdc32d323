//! Conversational tool handlers.
//!
//! These are the operations the conversational layer invokes on the user's
//! behalf. Every handler returns exactly one structured reply; raw error
//! text stays in the logs.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use keepsake_models::{
    AnalyzeReply, FeelingsReply, GenerateReply, IngestReply, NextPhotoReply, ProgressEvent,
    RequestId,
};
use keepsake_storage::ObjectStore;
use keepsake_store::PhotoStore;
use keepsake_vision::ImageAnalyzer;

use crate::error::PipelineError;
use crate::pipeline::VideoPipeline;

/// Tool surface over the store, the analyzer, and the pipeline.
pub struct ToolHandler {
    store: Arc<PhotoStore>,
    analyzer: ImageAnalyzer,
    objects: Arc<dyn ObjectStore>,
    pipeline: VideoPipeline,
}

impl ToolHandler {
    pub fn new(
        store: Arc<PhotoStore>,
        analyzer: ImageAnalyzer,
        objects: Arc<dyn ObjectStore>,
        pipeline: VideoPipeline,
    ) -> Self {
        Self {
            store,
            analyzer,
            objects,
            pipeline,
        }
    }

    /// Ingest an uploaded photo by its storage key.
    pub async fn ingest_photo(&self, file_key: &str) -> IngestReply {
        let bytes = match self.objects.get(file_key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key = file_key, "Failed to fetch upload: {}", e);
                return IngestReply::Failed;
            }
        };

        let format = image::guess_format(&bytes).ok();
        let image = match image::load_from_memory(&bytes) {
            Ok(image) => image,
            Err(e) => {
                warn!(key = file_key, "Failed to decode upload: {}", e);
                return IngestReply::Failed;
            }
        };

        match self.store.add_photo(image, Some(file_key), format).await {
            Ok((photo_name, true)) => {
                info!(photo = %photo_name, key = file_key, "Photo ingested");
                IngestReply::Stored { photo_name }
            }
            Ok((photo_name, false)) => {
                info!(photo = %photo_name, key = file_key, "Duplicate upload");
                IngestReply::Duplicate { photo_name }
            }
            Err(e) => {
                warn!(key = file_key, "Failed to store upload: {}", e);
                IngestReply::Failed
            }
        }
    }

    /// Pop the next photo awaiting review.
    pub async fn next_photo(&self) -> NextPhotoReply {
        match self.store.pop_next_photo().await {
            Some(photo_name) => NextPhotoReply::Photo { photo_name },
            None => NextPhotoReply::QueueEmpty,
        }
    }

    /// Analyze a photo and record its description.
    ///
    /// Model failure degrades to the fixed fallback sentence; the
    /// description is recorded either way so generation can proceed.
    pub async fn analyze_photo(&self, photo_name: &str) -> AnalyzeReply {
        let Some(image) = self.store.photo_image(photo_name).await else {
            return AnalyzeReply::NotFound {
                photo_name: photo_name.to_string(),
            };
        };

        let description = match self.analyzer.analyze(&image, Some(photo_name)).await {
            Some(text) => text,
            None => self.analyzer.fallback_response().to_string(),
        };

        self.store.record_description(photo_name, &description).await;

        AnalyzeReply::Analyzed {
            photo_name: photo_name.to_string(),
            description,
        }
    }

    /// Store what the user said about a photo.
    pub async fn store_feelings(
        &self,
        photo_name: &str,
        text: &str,
        user_id: Option<String>,
    ) -> FeelingsReply {
        if self.store.add_feeling(photo_name, text, user_id).await {
            FeelingsReply::Stored {
                photo_name: photo_name.to_string(),
            }
        } else {
            FeelingsReply::NotFound {
                photo_name: photo_name.to_string(),
            }
        }
    }

    /// Run the full generation pipeline.
    pub async fn generate_video(
        &self,
        progress: Option<mpsc::Sender<ProgressEvent>>,
        cancel: Option<watch::Receiver<bool>>,
    ) -> GenerateReply {
        let request_id = RequestId::new();

        match self.pipeline.run(request_id.clone(), progress, cancel).await {
            Ok(video_url) => GenerateReply::Completed {
                request_id,
                video_url,
            },
            Err(PipelineError::NothingToGenerate) => GenerateReply::NothingToGenerate,
            Err(PipelineError::Cancelled) => GenerateReply::Cancelled { request_id },
            Err(e @ PipelineError::StageFailed { stage, .. }) => {
                error!(request_id = %request_id, "Generation failed: {}", e);
                GenerateReply::Failed { request_id, stage }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::io::Cursor;

    use keepsake_media::{check_ffmpeg, FrameRenderer};
    use keepsake_storage::MemoryObjectStore;
    use keepsake_vision::{GenerativeModel, PromptPart, VisionError, VisionResult};

    use crate::config::PipelineConfig;

    struct ScriptedModel {
        reply: Option<String>,
    }

    #[async_trait]
    impl GenerativeModel for ScriptedModel {
        async fn generate(
            &self,
            _system_instruction: Option<&str>,
            _parts: Vec<PromptPart>,
        ) -> VisionResult<String> {
            match &self.reply {
                Some(text) => Ok(text.clone()),
                None => Err(VisionError::model_failed("scripted failure")),
            }
        }
    }

    fn handler_with(model: ScriptedModel) -> Option<(ToolHandler, Arc<MemoryObjectStore>)> {
        handler_with_config(model, PipelineConfig::default())
    }

    fn handler_with_config(
        model: ScriptedModel,
        config: PipelineConfig,
    ) -> Option<(ToolHandler, Arc<MemoryObjectStore>)> {
        let renderer = match FrameRenderer::with_defaults() {
            Ok(r) => Arc::new(r),
            Err(_) => {
                eprintln!("skipping: no caption font available");
                return None;
            }
        };

        let store = Arc::new(PhotoStore::new());
        let objects = Arc::new(MemoryObjectStore::new());
        let model: Arc<dyn GenerativeModel> = Arc::new(model);

        let pipeline = VideoPipeline::new(
            Arc::clone(&store),
            Arc::clone(&model),
            renderer,
            objects.clone() as Arc<dyn ObjectStore>,
            config,
        );

        let handler = ToolHandler::new(
            store,
            ImageAnalyzer::new(model),
            objects.clone() as Arc<dyn ObjectStore>,
            pipeline,
        );
        Some((handler, objects))
    }

    fn png_bytes(shade: u8) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, Rgb([shade, 90, 120])));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    async fn seed_upload(objects: &MemoryObjectStore, key: &str, shade: u8) {
        objects
            .put(png_bytes(shade), key, "image/png")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_ingest_then_next_photo() {
        let Some((handler, objects)) = handler_with(ScriptedModel {
            reply: Some("a lovely scene".to_string()),
        }) else {
            return;
        };

        seed_upload(&objects, "uploads/one.png", 10).await;
        let reply = handler.ingest_photo("uploads/one.png").await;
        assert_eq!(
            reply,
            IngestReply::Stored {
                photo_name: "image_0".to_string()
            }
        );

        assert_eq!(
            handler.next_photo().await,
            NextPhotoReply::Photo {
                photo_name: "image_0".to_string()
            }
        );
        assert_eq!(handler.next_photo().await, NextPhotoReply::QueueEmpty);
    }

    #[tokio::test]
    async fn test_ingest_duplicate_upload() {
        let Some((handler, objects)) = handler_with(ScriptedModel { reply: None }) else {
            return;
        };

        seed_upload(&objects, "uploads/a.png", 42).await;
        seed_upload(&objects, "uploads/b.png", 42).await;

        handler.ingest_photo("uploads/a.png").await;
        let reply = handler.ingest_photo("uploads/b.png").await;
        assert_eq!(
            reply,
            IngestReply::Duplicate {
                photo_name: "image_0".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_ingest_missing_key_fails() {
        let Some((handler, _)) = handler_with(ScriptedModel { reply: None }) else {
            return;
        };
        assert_eq!(handler.ingest_photo("uploads/missing.png").await, IngestReply::Failed);
    }

    #[tokio::test]
    async fn test_analyze_records_description() {
        let Some((handler, objects)) = handler_with(ScriptedModel {
            reply: Some("What a joyful gathering!".to_string()),
        }) else {
            return;
        };

        seed_upload(&objects, "uploads/p.png", 5).await;
        handler.ingest_photo("uploads/p.png").await;

        let reply = handler.analyze_photo("image_0").await;
        match reply {
            AnalyzeReply::Analyzed {
                photo_name,
                description,
            } => {
                assert_eq!(photo_name, "image_0");
                assert_eq!(description, "What a joyful gathering!");
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_analyze_unknown_photo() {
        let Some((handler, _)) = handler_with(ScriptedModel { reply: None }) else {
            return;
        };
        assert_eq!(
            handler.analyze_photo("image_99").await,
            AnalyzeReply::NotFound {
                photo_name: "image_99".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_analyze_falls_back_on_model_failure() {
        let Some((handler, objects)) = handler_with(ScriptedModel { reply: None }) else {
            return;
        };

        seed_upload(&objects, "uploads/p.png", 5).await;
        handler.ingest_photo("uploads/p.png").await;

        match handler.analyze_photo("image_0").await {
            AnalyzeReply::Analyzed { description, .. } => {
                assert!(!description.is_empty());
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_store_feelings_unknown_photo() {
        let Some((handler, _)) = handler_with(ScriptedModel { reply: None }) else {
            return;
        };
        assert_eq!(
            handler.store_feelings("nope", "so happy", None).await,
            FeelingsReply::NotFound {
                photo_name: "nope".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_generate_without_photos() {
        let Some((handler, _)) = handler_with(ScriptedModel { reply: None }) else {
            return;
        };
        assert_eq!(
            handler.generate_video(None, None).await,
            GenerateReply::NothingToGenerate
        );
    }

    #[tokio::test]
    async fn test_full_session_end_to_end() {
        if check_ffmpeg().is_err() {
            eprintln!("skipping: ffmpeg not installed");
            return;
        }
        let Some((handler, objects)) = handler_with(ScriptedModel {
            reply: Some(
                "A joyful day at the beach\nSunlight we will remember\nTogether, always".to_string(),
            ),
        }) else {
            return;
        };

        seed_upload(&objects, "uploads/day.png", 77).await;
        handler.ingest_photo("uploads/day.png").await;
        handler.next_photo().await;
        handler.analyze_photo("image_0").await;
        handler
            .store_feelings("image_0", "I was so happy at the beach with my family", None)
            .await;

        let (progress_tx, mut progress_rx) = mpsc::channel(32);
        let reply = handler.generate_video(Some(progress_tx), None).await;

        match reply {
            GenerateReply::Completed { video_url, .. } => {
                assert!(video_url.starts_with("memory://"));
                assert!(video_url.contains("memory-videos/"));
            }
            other => panic!("unexpected reply: {:?}", other),
        }

        // Advisory events arrive in stage order.
        let mut events = Vec::new();
        while let Ok(event) = progress_rx.try_recv() {
            events.push(event);
        }
        assert!(matches!(events.first(), Some(ProgressEvent::StoryboardBuilt { .. })));
        assert!(matches!(events.last(), Some(ProgressEvent::AssemblyFinished { .. })));

        // Uploaded video plus the original upload object.
        assert_eq!(objects.len().await, 2);
    }

    #[tokio::test]
    async fn test_cancelled_run_leaves_no_frames() {
        let Some((handler, objects)) = handler_with(ScriptedModel {
            reply: Some("One small caption\nAnother\nLast one".to_string()),
        }) else {
            return;
        };

        seed_upload(&objects, "uploads/p.png", 3).await;
        handler.ingest_photo("uploads/p.png").await;
        handler.analyze_photo("image_0").await;

        let frames_before = count_temp_frames();

        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let reply = handler.generate_video(None, Some(rx)).await;
        assert!(matches!(reply, GenerateReply::Cancelled { .. }));
        assert_eq!(count_temp_frames(), frames_before);
    }

    #[tokio::test]
    async fn test_failed_assembly_leaves_no_temp_files() {
        // A zero-second encode budget fails the assembly stage whether or
        // not ffmpeg is installed (instant timeout vs. not found).
        let Some((handler, objects)) = handler_with_config(
            ScriptedModel {
                reply: Some("One small caption\nAnother\nLast one".to_string()),
            },
            PipelineConfig {
                encode_timeout_secs: 0,
                ..Default::default()
            },
        ) else {
            return;
        };

        seed_upload(&objects, "uploads/p.png", 9).await;
        handler.ingest_photo("uploads/p.png").await;
        handler.analyze_photo("image_0").await;
        handler
            .store_feelings("image_0", "I was so happy that day", None)
            .await;

        let frames_before = count_temp_files("keepsake_frame_");
        let lists_before = count_temp_files("keepsake_list_");

        let reply = handler.generate_video(None, None).await;
        assert!(matches!(
            reply,
            GenerateReply::Failed {
                stage: keepsake_models::PipelineStage::Assembly,
                ..
            }
        ));

        assert_eq!(count_temp_files("keepsake_frame_"), frames_before);
        assert_eq!(count_temp_files("keepsake_list_"), lists_before);
        // Nothing was published.
        assert_eq!(objects.len().await, 1);
    }

    fn count_temp_frames() -> usize {
        count_temp_files("keepsake_frame_")
    }

    fn count_temp_files(prefix: &str) -> usize {
        std::fs::read_dir(std::env::temp_dir())
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
                    .count()
            })
            .unwrap_or(0)
    }
}
