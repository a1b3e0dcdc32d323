//! Caption frame rendering.

use std::io::BufWriter;
use std::path::PathBuf;

use ab_glyph::{FontVec, PxScale};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{MediaError, MediaResult};

/// JPEG quality for saved frames.
const JPEG_QUALITY: u8 = 95;

/// Candidate caption fonts, checked in order.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
];

/// Frame rendering settings.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Caption font size in pixels
    pub font_px: f32,
    /// Margin between the caption block and the bottom edge
    pub margin: u32,
    /// Opacity of the caption band (0-255)
    pub band_alpha: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            font_px: 48.0,
            margin: 60,
            band_alpha: 180,
        }
    }
}

/// Rasterizes one still frame per caption.
///
/// The base photo is letterboxed onto a black canvas once, then each
/// caption is overlaid on a copy: a translucent band across the lower
/// third, shadowed white text centered inside it.
pub struct FrameRenderer {
    config: RenderConfig,
    font: FontVec,
}

impl FrameRenderer {
    /// Create a renderer, loading the first available caption font.
    pub fn new(config: RenderConfig) -> MediaResult<Self> {
        let font = load_font()?;
        Ok(Self { config, font })
    }

    /// Create a renderer with default settings.
    pub fn with_defaults() -> MediaResult<Self> {
        Self::new(RenderConfig::default())
    }

    /// Render one temp-file frame per caption, in input order.
    ///
    /// Fails closed: any error removes every frame already written and
    /// returns the error, never a partial list. Deleting the returned
    /// files after use is the caller's obligation.
    pub fn render(&self, base: &DynamicImage, captions: &[String]) -> MediaResult<Vec<PathBuf>> {
        info!(caption_count = captions.len(), "Rendering caption frames");

        let canvas = self.letterbox(base);
        let run_id = Uuid::new_v4().simple().to_string();

        let mut paths = Vec::with_capacity(captions.len());
        for (index, caption) in captions.iter().enumerate() {
            let mut frame = canvas.clone();
            self.draw_caption(&mut frame, caption);

            let path = std::env::temp_dir().join(format!(
                "keepsake_frame_{}_{:03}.jpg",
                run_id, index
            ));

            if let Err(e) = save_jpeg(&frame, &path) {
                warn!(frame = index, "Frame render failed, discarding partial output");
                cleanup_frames(&paths);
                return Err(e);
            }

            debug!(frame = index, path = %path.display(), "Saved frame");
            paths.push(path);
        }

        info!(frame_count = paths.len(), "Rendered all frames");
        Ok(paths)
    }

    /// Letterbox the photo onto a black canvas, preserving aspect ratio.
    fn letterbox(&self, image: &DynamicImage) -> RgbImage {
        let (new_w, new_h) = fit_within(
            image.width(),
            image.height(),
            self.config.width,
            self.config.height,
        );

        let resized = imageops::resize(&image.to_rgb8(), new_w, new_h, FilterType::Lanczos3);

        let mut canvas = RgbImage::new(self.config.width, self.config.height);
        let x = (self.config.width.saturating_sub(new_w)) / 2;
        let y = (self.config.height.saturating_sub(new_h)) / 2;
        imageops::overlay(&mut canvas, &resized, x as i64, y as i64);
        canvas
    }

    /// Overlay the caption band and shadowed text on a frame.
    fn draw_caption(&self, frame: &mut RgbImage, caption: &str) {
        let scale = PxScale::from(self.config.font_px);
        let (text_w, text_h) = text_size(scale, &self.font, caption);
        let (text_w, text_h) = (text_w as i64, text_h as i64);

        let width = self.config.width as i64;
        let height = self.config.height as i64;
        let margin = self.config.margin as i64;

        let text_x = ((width - text_w) / 2).max(0);
        let text_y = (height - text_h - margin).max(0);

        // Translucent band from just above the text to the bottom edge.
        let band_top = (text_y - margin / 2).max(0) as u32;
        let keep = (255 - self.config.band_alpha) as u16;
        for y in band_top..self.config.height {
            for x in 0..self.config.width {
                let pixel = frame.get_pixel_mut(x, y);
                for channel in pixel.0.iter_mut() {
                    *channel = ((*channel as u16 * keep) / 255) as u8;
                }
            }
        }

        // Shadow first, then the solid text on top.
        draw_text_mut(
            frame,
            Rgb([0, 0, 0]),
            (text_x + 2) as i32,
            (text_y + 2) as i32,
            scale,
            &self.font,
            caption,
        );
        draw_text_mut(
            frame,
            Rgb([255, 255, 255]),
            text_x as i32,
            text_y as i32,
            scale,
            &self.font,
            caption,
        );
    }
}

/// Scale dimensions to fit within the target, preserving aspect ratio.
/// One target dimension is fully covered; the other is letterboxed.
pub fn fit_within(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> (u32, u32) {
    if src_w == 0 || src_h == 0 {
        return (dst_w, dst_h);
    }

    let scale_w = dst_w as f64 / src_w as f64;
    let scale_h = dst_h as f64 / src_h as f64;
    let scale = scale_w.min(scale_h);

    let new_w = ((src_w as f64 * scale).round() as u32).max(1).min(dst_w);
    let new_h = ((src_h as f64 * scale).round() as u32).max(1).min(dst_h);
    (new_w, new_h)
}

/// Best-effort removal of rendered frame files.
pub fn cleanup_frames(paths: &[PathBuf]) {
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "Removed temp frame"),
            Err(e) => warn!(path = %path.display(), "Failed to remove temp frame: {}", e),
        }
    }
}

fn load_font() -> MediaResult<FontVec> {
    for candidate in FONT_CANDIDATES {
        if let Ok(bytes) = std::fs::read(candidate) {
            if let Ok(font) = FontVec::try_from_vec(bytes) {
                debug!(font = candidate, "Loaded caption font");
                return Ok(font);
            }
            warn!(font = candidate, "Font file exists but failed to parse");
        }
    }
    Err(MediaError::FontNotFound)
}

fn save_jpeg(frame: &RgbImage, path: &std::path::Path) -> MediaResult<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    let mut encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
    encoder.encode_image(frame)?;
    Ok(())
}
