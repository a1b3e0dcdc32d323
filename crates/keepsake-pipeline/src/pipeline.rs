//! The video-generation pipeline.
//!
//! One run walks storyboard → captions → frames → assembly over the most
//! recently described photo. Progress events are advisory; cancellation is
//! checked between stages and inside the encoder. Temp frames are removed
//! on every exit path.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use keepsake_media::frame::cleanup_frames;
use keepsake_media::FrameRenderer;
use keepsake_models::{PipelineStage, ProgressEvent, RequestId};
use keepsake_storage::ObjectStore;
use keepsake_store::PhotoStore;
use keepsake_vision::{CaptionWriter, GenerativeModel};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::storyboard::build_storyboard;
use crate::video::VideoAssembler;

/// Orchestrates one photo-memory video run end to end.
pub struct VideoPipeline {
    store: Arc<PhotoStore>,
    captions: CaptionWriter,
    renderer: Arc<FrameRenderer>,
    assembler: VideoAssembler,
}

impl VideoPipeline {
    pub fn new(
        store: Arc<PhotoStore>,
        model: Arc<dyn GenerativeModel>,
        renderer: Arc<FrameRenderer>,
        objects: Arc<dyn ObjectStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            captions: CaptionWriter::new(model),
            renderer,
            assembler: VideoAssembler::new(objects, config),
        }
    }

    /// Run the pipeline, returning the presigned URL of the finished video.
    pub async fn run(
        &self,
        request_id: RequestId,
        progress: Option<mpsc::Sender<ProgressEvent>>,
        cancel: Option<watch::Receiver<bool>>,
    ) -> PipelineResult<String> {
        // Precondition: at least one photo with a stored description.
        let (photo_name, description) = self
            .store
            .latest_described_photo()
            .await
            .ok_or(PipelineError::NothingToGenerate)?;

        info!(request_id = %request_id, photo = %photo_name, "Starting video generation");

        let transcript = self.store.transcript().await;

        if is_cancelled(&cancel) {
            return Err(PipelineError::Cancelled);
        }

        // Stage 1: storyboard (pure, infallible).
        let scenes = build_storyboard(&transcript, &description);
        emit(
            &progress,
            ProgressEvent::StoryboardBuilt {
                request_id: request_id.clone(),
                scene_count: scenes.len(),
            },
        )
        .await;

        let image = self.store.photo_image(&photo_name).await.ok_or_else(|| {
            PipelineError::stage_failed(PipelineStage::Storyboard, "photo record disappeared")
        })?;

        // Stage 2: captions (degrades internally, never fails).
        let captions = self.captions.captions_for(&scenes, &transcript, &image).await;
        emit(
            &progress,
            ProgressEvent::CaptionsBuilt {
                request_id: request_id.clone(),
                caption_count: captions.len(),
            },
        )
        .await;

        if is_cancelled(&cancel) {
            return Err(PipelineError::Cancelled);
        }

        // Stage 3: frames. CPU-bound rasterization runs off the executor.
        let renderer = Arc::clone(&self.renderer);
        let render_image = image.clone();
        let render_captions = captions.clone();
        let frames = tokio::task::spawn_blocking(move || {
            renderer.render(&render_image, &render_captions)
        })
        .await
        .map_err(|e| PipelineError::stage_failed(PipelineStage::Frames, e.to_string()))?
        .map_err(|e| PipelineError::stage_failed(PipelineStage::Frames, e.to_string()))?;

        emit(
            &progress,
            ProgressEvent::FramesBuilt {
                request_id: request_id.clone(),
                frame_count: frames.len(),
            },
        )
        .await;

        if is_cancelled(&cancel) {
            warn!(request_id = %request_id, "Run cancelled after frame render, cleaning up");
            cleanup_frames(&frames);
            return Err(PipelineError::Cancelled);
        }

        // Stage 4: assembly. Frames are removed whatever the outcome.
        emit(
            &progress,
            ProgressEvent::AssemblyStarted {
                request_id: request_id.clone(),
            },
        )
        .await;

        let result = self.assembler.assemble(&frames, &scenes, cancel).await;
        cleanup_frames(&frames);

        match result {
            Ok(url) => {
                emit(
                    &progress,
                    ProgressEvent::AssemblyFinished {
                        request_id: request_id.clone(),
                    },
                )
                .await;
                info!(request_id = %request_id, "Video generation finished");
                Ok(url)
            }
            Err(e) => {
                error!(request_id = %request_id, "Video generation failed: {}", e);
                Err(e)
            }
        }
    }
}

fn is_cancelled(cancel: &Option<watch::Receiver<bool>>) -> bool {
    cancel.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
}

/// Send an advisory event; a full or closed channel is not an error.
async fn emit(progress: &Option<mpsc::Sender<ProgressEvent>>, event: ProgressEvent) {
    if let Some(tx) = progress {
        let _ = tx.send(event).await;
    }
}
