//! FFmpeg slideshow encoding.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{MediaError, MediaResult};

/// Default encode timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// One slide in the output video.
#[derive(Debug, Clone)]
pub struct SlideEntry {
    /// Path to the rendered frame image
    pub path: PathBuf,
    /// Seconds this slide stays on screen
    pub hold_secs: f64,
}

impl SlideEntry {
    pub fn new(path: impl Into<PathBuf>, hold_secs: f64) -> Self {
        Self {
            path: path.into(),
            hold_secs,
        }
    }
}

/// A full slideshow: ordered slides plus encode parameters.
#[derive(Debug, Clone)]
pub struct SlideshowPlan {
    /// Slides in playback order
    pub entries: Vec<SlideEntry>,
    /// Fade-in/fade-out duration in seconds
    pub fade_secs: f64,
    /// Output frame rate
    pub fps: u32,
}

impl SlideshowPlan {
    pub fn new(entries: Vec<SlideEntry>) -> Self {
        Self {
            entries,
            fade_secs: 0.5,
            fps: 30,
        }
    }

    /// Total playback duration in seconds.
    pub fn total_duration(&self) -> f64 {
        self.entries.iter().map(|e| e.hold_secs).sum()
    }

    /// Build the concat demuxer script.
    ///
    /// Each slide contributes a `file`/`duration` pair; the last file is
    /// repeated without a duration so the demuxer honors the final hold.
    pub fn concat_script(&self) -> MediaResult<String> {
        let last = self.entries.last().ok_or(MediaError::EmptyPlan)?;

        let mut script = String::new();
        for entry in &self.entries {
            script.push_str(&format!(
                "file '{}'\nduration {:.3}\n",
                escape_concat_path(&entry.path),
                entry.hold_secs
            ));
        }
        script.push_str(&format!("file '{}'\n", escape_concat_path(&last.path)));
        Ok(script)
    }

    /// Video filter applying a fade-in at the start and a fade-out at the end.
    pub fn fade_filter(&self) -> String {
        let fade_out_start = (self.total_duration() - self.fade_secs).max(0.0);
        format!(
            "fade=t=in:st=0:d={fade:.3},fade=t=out:st={st:.3}:d={fade:.3}",
            fade = self.fade_secs,
            st = fade_out_start,
        )
    }

    /// Full FFmpeg argument list for this plan.
    pub fn build_args(&self, list_path: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            list_path.to_string_lossy().to_string(),
            "-vf".to_string(),
            self.fade_filter(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            "-crf".to_string(),
            "23".to_string(),
            "-r".to_string(),
            self.fps.to_string(),
            output.to_string_lossy().to_string(),
        ]
    }
}

/// Escape a path for the concat demuxer's single-quoted `file` directive.
fn escape_concat_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "\\'")
}

/// Runs FFmpeg encodes with a timeout and optional cancellation.
pub struct EncoderRunner {
    timeout_secs: u64,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl Default for EncoderRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderRunner {
    pub fn new() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cancel_rx: None,
        }
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Encode the plan's slides into a video at `output`.
    ///
    /// The concat list file is written to the temp dir and removed again on
    /// every exit path. Timeout and cancellation both kill the subprocess.
    pub async fn encode(&self, plan: &SlideshowPlan, output: &Path) -> MediaResult<()> {
        check_ffmpeg()?;

        for entry in &plan.entries {
            if !entry.path.exists() {
                return Err(MediaError::FileNotFound(entry.path.clone()));
            }
        }

        let script = plan.concat_script()?;
        let list_path = std::env::temp_dir().join(format!(
            "keepsake_list_{}.txt",
            Uuid::new_v4().simple()
        ));
        tokio::fs::write(&list_path, &script).await?;

        let result = self.run_ffmpeg(plan, &list_path, output).await;

        if let Err(e) = tokio::fs::remove_file(&list_path).await {
            warn!(path = %list_path.display(), "Failed to remove concat list: {}", e);
        }

        result
    }

    async fn run_ffmpeg(
        &self,
        plan: &SlideshowPlan,
        list_path: &Path,
        output: &Path,
    ) -> MediaResult<()> {
        let args = plan.build_args(list_path, output);
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));
        info!(
            slides = plan.entries.len(),
            duration_secs = plan.total_duration(),
            output = %output.display(),
            "Encoding slideshow"
        );

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child.stderr.take().expect("stderr not captured");
        let stderr_task = tokio::spawn(async move {
            let mut reader = tokio::io::BufReader::new(stderr);
            let mut buf = String::new();
            let _ = reader.read_to_string(&mut buf).await;
            buf
        });

        let status = self.wait_for_completion(&mut child).await;
        let stderr_text = stderr_task.await.unwrap_or_default();

        let status = status?;
        if status.success() {
            info!(output = %output.display(), "Encode finished");
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(stderr_text),
                status.code(),
            ))
        }
    }

    /// Wait for the child, killing it on timeout or cancellation.
    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<std::process::ExitStatus> {
        let mut cancel_rx = self.cancel_rx.clone();
        let duration = std::time::Duration::from_secs(self.timeout_secs);

        let waited = tokio::time::timeout(duration, async {
            tokio::select! {
                status = child.wait() => Some(status),
                _ = wait_for_cancel(&mut cancel_rx) => None,
            }
        })
        .await;

        match waited {
            Err(_) => {
                warn!(
                    "FFmpeg timed out after {} seconds, killing process",
                    self.timeout_secs
                );
                let _ = child.kill().await;
                Err(MediaError::Timeout(self.timeout_secs))
            }
            Ok(None) => {
                info!("Encode cancelled, killing FFmpeg");
                let _ = child.kill().await;
                Err(MediaError::Cancelled)
            }
            Ok(Some(status)) => Ok(status?),
        }
    }
}

/// Resolves when the cancel signal flips to true; pends forever otherwise.
async fn wait_for_cancel(cancel_rx: &mut Option<watch::Receiver<bool>>) {
    if let Some(rx) = cancel_rx {
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    }
    std::future::pending::<()>().await
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}
