//! Storyboard scenes and emotional tones.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Emotional tone attached to a scene, driving caption style.
///
/// The vocabulary is fixed; tones outside this set never enter the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Joyful,
    Peaceful,
    Warm,
    Contemplative,
    Excited,
    Grateful,
    Nostalgic,
    Reflective,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Joyful => "joyful",
            Tone::Peaceful => "peaceful",
            Tone::Warm => "warm",
            Tone::Contemplative => "contemplative",
            Tone::Excited => "excited",
            Tone::Grateful => "grateful",
            Tone::Nostalgic => "nostalgic",
            Tone::Reflective => "reflective",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single scene in a memory-video storyboard.
///
/// Scenes are ephemeral: they exist only for the duration of one
/// video-generation run and are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Seed caption text for this scene
    pub caption: String,
    /// How long the scene is held, in seconds (always positive)
    pub duration: f64,
    /// Emotional tone driving the final caption
    pub tone: Tone,
}

impl Scene {
    pub fn new(caption: impl Into<String>, duration: f64, tone: Tone) -> Self {
        Self {
            caption: caption.into(),
            duration,
            tone,
        }
    }
}
