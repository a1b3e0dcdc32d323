//! Image analysis adapter.

use std::sync::Arc;

use image::DynamicImage;
use tracing::{info, warn};

use crate::gemini::{GenerativeModel, PromptPart};

/// System prompt biasing the model toward warm, short, conversational
/// descriptions suitable for being spoken aloud.
const ANALYSIS_PROMPT: &str = "\
Look at this photo and analyze it as if you're helping someone create a memory diary.

Please provide:
1. A brief description of what you see in the photo
2. The emotional tone or mood you sense from the scene/people
3. What kind of moment this appears to be (celebration, quiet moment, adventure, etc.)
4. A warm, empathetic question about their feelings or thoughts during this moment

Keep your response conversational and caring, as if talking to a friend about their memories.
This response will be used in a voice conversation, so keep it short and make it sound like a conversation.";

/// Stock sentence substituted by callers when analysis fails.
const FALLBACK_RESPONSE: &str = "\
I can see you've shared a photo with me! While I'm having trouble analyzing \
the details right now, I'd love to hear about this moment from you. \
What was happening when you took this photo, and how were you feeling?";

/// Wraps the vision model behind a stable analyze contract.
///
/// Any failure (network, quota, malformed response) yields `None`; the
/// caller decides whether to substitute `fallback_response()`. No retry
/// happens here, keeping failure handling at the orchestration layer.
pub struct ImageAnalyzer {
    model: Arc<dyn GenerativeModel>,
}

impl ImageAnalyzer {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// Analyze a photo, producing a spoken-style description.
    ///
    /// `context` is an optional upload reference used only for logging.
    pub async fn analyze(&self, image: &DynamicImage, context: Option<&str>) -> Option<String> {
        let label = context.unwrap_or("uploaded image");
        info!(photo = %label, "Starting image analysis");

        let image_part = match PromptPart::from_image(image) {
            Ok(part) => part,
            Err(e) => {
                warn!(photo = %label, "Failed to encode image for analysis: {}", e);
                return None;
            }
        };

        let parts = vec![PromptPart::text("Analyze this photo"), image_part];
        match self.model.generate(Some(ANALYSIS_PROMPT), parts).await {
            Ok(text) => {
                info!(photo = %label, "Image analysis succeeded");
                Some(text)
            }
            Err(e) => {
                warn!(photo = %label, "Image analysis failed: {}", e);
                None
            }
        }
    }

    /// Fixed empathetic response for when analysis fails.
    pub fn fallback_response(&self) -> &'static str {
        FALLBACK_RESPONSE
    }
}
