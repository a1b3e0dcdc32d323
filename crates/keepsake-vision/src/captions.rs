//! Scene caption synthesis.

use std::sync::Arc;

use image::DynamicImage;
use tracing::{info, warn};

use keepsake_models::Scene;

use crate::gemini::{GenerativeModel, PromptPart};

/// Captions kept at or under this many words; the model is asked for 10.
const MAX_CAPTION_WORDS: usize = 12;

/// Deterministic captions substituted when the model fails or under-delivers.
const FALLBACK_CAPTIONS: [&str; 5] = [
    "A moment to remember",
    "Captured in time",
    "This memory matters",
    "Forever in my heart",
    "A story worth telling",
];

/// Turns storyboard scenes into final on-screen captions.
///
/// This component never fails a run: any model or parse error degrades to
/// the fallback caption list, and the result always has exactly one caption
/// per scene.
pub struct CaptionWriter {
    model: Arc<dyn GenerativeModel>,
}

impl CaptionWriter {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// Generate one caption per scene, in scene order.
    pub async fn captions_for(
        &self,
        scenes: &[Scene],
        transcript: &str,
        image: &DynamicImage,
    ) -> Vec<String> {
        info!(scene_count = scenes.len(), "Generating scene captions");

        let image_part = match PromptPart::from_image(image) {
            Ok(part) => part,
            Err(e) => {
                warn!("Failed to encode image for captions: {}", e);
                return fallback_captions(scenes.len());
            }
        };

        let prompt = build_prompt(scenes, transcript);
        let parts = vec![PromptPart::Text(prompt), image_part];

        match self.model.generate(None, parts).await {
            Ok(raw) => {
                let captions = parse_captions(&raw, scenes.len());
                info!(caption_count = captions.len(), "Captions ready");
                captions
            }
            Err(e) => {
                warn!("Caption generation failed, using fallbacks: {}", e);
                fallback_captions(scenes.len())
            }
        }
    }
}

/// Build the single prompt embedding transcript and per-scene tone/seed.
fn build_prompt(scenes: &[Scene], transcript: &str) -> String {
    let scene_lines: Vec<String> = scenes
        .iter()
        .enumerate()
        .map(|(i, scene)| format!("Scene {}: {} tone - {}", i + 1, scene.tone, scene.caption))
        .collect();

    format!(
        "Based on this conversation: {transcript}\n\n\
         And looking at this photo, generate captions for these specific scenes:\n\
         {scene_list}\n\n\
         For each scene, create a caption (max 10 words) that matches the emotional tone:\n\n\
         Guidelines:\n\
         - Match the emotional tone specified for each scene\n\
         - Keep captions under 10 words each\n\
         - Make them flow together as a story\n\
         - Use warm, personal language\n\
         - Focus on emotions and feelings\n\n\
         Return only the captions, one per line, in the same order as the scenes listed above.",
        transcript = transcript,
        scene_list = scene_lines.join("\n"),
    )
}

/// Parse raw model output into exactly `expected` captions.
fn parse_captions(raw: &str, expected: usize) -> Vec<String> {
    let mut captions: Vec<String> = raw
        .lines()
        .filter_map(clean_line)
        .filter(|line| line.split_whitespace().count() <= MAX_CAPTION_WORDS)
        .collect();

    if captions.is_empty() {
        return fallback_captions(expected);
    }

    if captions.len() < expected {
        let mut fill = FALLBACK_CAPTIONS.iter().cycle();
        while captions.len() < expected {
            captions.push(fill.next().expect("cycle never ends").to_string());
        }
    } else if captions.len() > expected {
        captions.truncate(expected);
    }

    captions
}

/// Strip markdown emphasis, enumeration markers, and `Scene N:` prefixes.
/// Returns `None` for lines with no usable text left.
fn clean_line(line: &str) -> Option<String> {
    let no_emphasis = line.replace("**", "");
    let mut text = no_emphasis.trim();

    // Leading enumeration: "1." / "2)" / "-" / "*"
    if let Some(rest) = strip_enumeration(text) {
        text = rest.trim();
    }

    // "Scene N:" prefix up to the colon
    if text.starts_with("Scene") {
        if let Some(colon) = text.find(':') {
            text = text[colon + 1..].trim();
        }
    }

    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn strip_enumeration(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        return rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'));
    }
    line.strip_prefix("- ").or_else(|| line.strip_prefix("* "))
}

/// The fallback list sized to `count`, cycling when more are needed.
fn fallback_captions(count: usize) -> Vec<String> {
    FALLBACK_CAPTIONS
        .iter()
        .cycle()
        .take(count)
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{VisionError, VisionResult};
    use async_trait::async_trait;
    use keepsake_models::Tone;

    struct ScriptedModel {
        reply: Result<String, ()>,
    }

    #[async_trait]
    impl GenerativeModel for ScriptedModel {
        async fn generate(
            &self,
            _system_instruction: Option<&str>,
            _parts: Vec<PromptPart>,
        ) -> VisionResult<String> {
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(VisionError::model_failed("scripted failure")),
            }
        }
    }

    fn scenes(count: usize) -> Vec<Scene> {
        (0..count)
            .map(|i| Scene::new(format!("seed {}", i), 2.5, Tone::Reflective))
            .collect()
    }

    #[test]
    fn test_parse_strips_markdown_and_numbering() {
        let raw = "**1. The sun melts into the sea**\n2) A breath of evening calm\nScene 3: Held close, always";
        let captions = parse_captions(raw, 3);
        assert_eq!(
            captions,
            vec![
                "The sun melts into the sea",
                "A breath of evening calm",
                "Held close, always",
            ]
        );
    }

    #[test]
    fn test_parse_discards_overlong_lines() {
        let raw = "Short and sweet\n\
                   this caption rambles on and on with far too many words to ever fit a frame";
        let captions = parse_captions(raw, 2);
        assert_eq!(captions[0], "Short and sweet");
        // The discarded line is replaced from the fallback list.
        assert_eq!(captions[1], FALLBACK_CAPTIONS[0]);
    }

    #[test]
    fn test_parse_pads_and_cycles_fallbacks() {
        let captions = parse_captions("Only one line", 7);
        assert_eq!(captions.len(), 7);
        assert_eq!(captions[0], "Only one line");
        assert_eq!(captions[1], FALLBACK_CAPTIONS[0]);
        assert_eq!(captions[6], FALLBACK_CAPTIONS[0]);
    }

    #[test]
    fn test_parse_truncates_overrun() {
        let raw = "one\ntwo\nthree\nfour\nfive";
        let captions = parse_captions(raw, 3);
        assert_eq!(captions, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_parse_empty_response_degrades_fully() {
        let captions = parse_captions("", 4);
        assert_eq!(captions.len(), 4);
        assert_eq!(captions[0], FALLBACK_CAPTIONS[0]);
        assert_eq!(captions[3], FALLBACK_CAPTIONS[3]);
    }

    #[tokio::test]
    async fn test_caption_count_matches_scenes_on_model_failure() {
        let writer = CaptionWriter::new(Arc::new(ScriptedModel { reply: Err(()) }));
        let captions = writer
            .captions_for(&scenes(5), "a day to remember", &DynamicImage::new_rgb8(4, 4))
            .await;
        assert_eq!(captions.len(), 5);
    }

    #[tokio::test]
    async fn test_caption_count_matches_scenes_on_success() {
        let writer = CaptionWriter::new(Arc::new(ScriptedModel {
            reply: Ok("Golden light on water\nA quiet goodbye".to_string()),
        }));
        let captions = writer
            .captions_for(&scenes(3), "watching the sunset", &DynamicImage::new_rgb8(4, 4))
            .await;
        assert_eq!(captions.len(), 3);
        assert_eq!(captions[0], "Golden light on water");
    }

    #[test]
    fn test_prompt_embeds_scene_tones() {
        let prompt = build_prompt(&scenes(2), "a lovely day");
        assert!(prompt.contains("a lovely day"));
        assert!(prompt.contains("Scene 1: reflective tone - seed 0"));
        assert!(prompt.contains("Scene 2: reflective tone - seed 1"));
    }
}
