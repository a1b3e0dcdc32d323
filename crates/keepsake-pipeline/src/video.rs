//! Video assembly: encode rendered frames and publish the result.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use keepsake_media::{EncoderRunner, MediaError, SlideEntry, SlideshowPlan};
use keepsake_models::{PipelineStage, Scene};
use keepsake_storage::ObjectStore;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};

/// Encodes frames into an MP4, uploads it, and returns a presigned URL.
///
/// The local encoded file and the edit list are removed on every exit
/// path; the uploaded object is the only durable artifact.
pub struct VideoAssembler {
    objects: Arc<dyn ObjectStore>,
    config: PipelineConfig,
}

impl VideoAssembler {
    pub fn new(objects: Arc<dyn ObjectStore>, config: PipelineConfig) -> Self {
        Self { objects, config }
    }

    /// Assemble `frames` into a video timed by `scenes`.
    pub async fn assemble(
        &self,
        frames: &[PathBuf],
        scenes: &[Scene],
        cancel: Option<watch::Receiver<bool>>,
    ) -> PipelineResult<String> {
        let plan = build_plan(frames, scenes, &self.config);

        let filename = unique_filename();
        let output = std::env::temp_dir().join(&filename);

        let mut runner = EncoderRunner::new().with_timeout(self.config.encode_timeout_secs);
        if let Some(rx) = cancel {
            runner = runner.with_cancel(rx);
        }

        let result = self.encode_and_upload(&runner, &plan, &output, &filename).await;

        if output.exists() {
            if let Err(e) = tokio::fs::remove_file(&output).await {
                warn!(path = %output.display(), "Failed to remove encoded video: {}", e);
            } else {
                debug!(path = %output.display(), "Removed local encoded video");
            }
        }

        result
    }

    async fn encode_and_upload(
        &self,
        runner: &EncoderRunner,
        plan: &SlideshowPlan,
        output: &Path,
        filename: &str,
    ) -> PipelineResult<String> {
        runner.encode(plan, output).await.map_err(assembly_error)?;

        let bytes = tokio::fs::read(output)
            .await
            .map_err(|e| PipelineError::stage_failed(PipelineStage::Assembly, e.to_string()))?;

        let key = format!("{}/{}", self.config.video_prefix, filename);
        self.objects
            .put(bytes, &key, "video/mp4")
            .await
            .map_err(|e| PipelineError::stage_failed(PipelineStage::Assembly, e.to_string()))?;

        let url = self
            .objects
            .presigned_url(&key, self.config.presign_ttl)
            .await
            .map_err(|e| PipelineError::stage_failed(PipelineStage::Assembly, e.to_string()))?;

        info!(key = %key, "Video uploaded and presigned");
        Ok(url)
    }
}

/// Pair frames with scene durations. A length mismatch is tolerated by
/// truncating both sides to the shorter length.
fn build_plan(frames: &[PathBuf], scenes: &[Scene], config: &PipelineConfig) -> SlideshowPlan {
    if frames.len() != scenes.len() {
        warn!(
            frames = frames.len(),
            scenes = scenes.len(),
            "Frame count does not match scene count, truncating"
        );
    }

    let entries = frames
        .iter()
        .zip(scenes.iter())
        .map(|(path, scene)| SlideEntry::new(path.clone(), scene.duration))
        .collect();

    let mut plan = SlideshowPlan::new(entries);
    plan.fade_secs = config.fade_secs;
    plan.fps = config.fps;
    plan
}

fn unique_filename() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let unique_id = Uuid::new_v4().simple().to_string();
    format!("memory_video_{}_{}.mp4", timestamp, &unique_id[..8])
}

fn assembly_error(e: MediaError) -> PipelineError {
    match e {
        MediaError::Cancelled => PipelineError::Cancelled,
        other => PipelineError::stage_failed(PipelineStage::Assembly, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepsake_models::Tone;

    fn scene(duration: f64) -> Scene {
        Scene::new("seed", duration, Tone::Reflective)
    }

    #[test]
    fn test_plan_pairs_frames_with_scene_durations() {
        let frames = vec![PathBuf::from("/tmp/a.jpg"), PathBuf::from("/tmp/b.jpg")];
        let scenes = vec![scene(2.0), scene(3.5)];

        let plan = build_plan(&frames, &scenes, &PipelineConfig::default());
        assert_eq!(plan.entries.len(), 2);
        assert!((plan.entries[1].hold_secs - 3.5).abs() < f64::EPSILON);
        assert!((plan.total_duration() - 5.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_plan_truncates_on_mismatch() {
        let frames = vec![
            PathBuf::from("/tmp/a.jpg"),
            PathBuf::from("/tmp/b.jpg"),
            PathBuf::from("/tmp/c.jpg"),
        ];
        let scenes = vec![scene(2.0), scene(2.0)];

        let plan = build_plan(&frames, &scenes, &PipelineConfig::default());
        assert_eq!(plan.entries.len(), 2);
    }

    #[test]
    fn test_plan_carries_config_settings() {
        let config = PipelineConfig {
            fade_secs: 1.0,
            fps: 24,
            ..Default::default()
        };
        let plan = build_plan(&[PathBuf::from("/tmp/a.jpg")], &[scene(2.0)], &config);
        assert!((plan.fade_secs - 1.0).abs() < f64::EPSILON);
        assert_eq!(plan.fps, 24);
    }

    #[test]
    fn test_filenames_are_unique_and_prefixed() {
        let a = unique_filename();
        let b = unique_filename();
        assert_ne!(a, b);
        assert!(a.starts_with("memory_video_"));
        assert!(a.ends_with(".mp4"));
    }

    #[test]
    fn test_cancelled_encode_maps_to_cancelled() {
        assert!(matches!(
            assembly_error(MediaError::Cancelled),
            PipelineError::Cancelled
        ));
        assert!(matches!(
            assembly_error(MediaError::Timeout(120)),
            PipelineError::StageFailed {
                stage: PipelineStage::Assembly,
                ..
            }
        ));
    }
}
