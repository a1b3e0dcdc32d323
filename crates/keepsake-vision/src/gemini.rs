//! Gemini REST client behind the `GenerativeModel` seam.

use std::io::Cursor;

use async_trait::async_trait;
use base64::Engine;
use image::{DynamicImage, ImageFormat};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{VisionError, VisionResult};

/// One part of a multimodal prompt.
#[derive(Debug, Clone)]
pub enum PromptPart {
    Text(String),
    /// PNG-encoded image bytes.
    ImagePng(Vec<u8>),
}

impl PromptPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Encode a decoded image as a PNG prompt part.
    pub fn from_image(image: &DynamicImage) -> VisionResult<Self> {
        let mut buf = Vec::new();
        image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        Ok(Self::ImagePng(buf))
    }
}

/// External vision/caption model contract: text and image parts in, raw
/// text out. Implementations may fail; callers own every fallback.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(
        &self,
        system_instruction: Option<&str>,
        parts: Vec<PromptPart>,
    ) -> VisionResult<String>;
}

/// Configuration for the Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for the Generative Language API
    pub api_key: String,
    /// Model name (e.g. "gemini-2.0-flash-exp")
    pub model: String,
}

impl GeminiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> VisionResult<Self> {
        Ok(Self {
            api_key: std::env::var("GOOGLE_API_KEY")
                .map_err(|_| VisionError::config_error("GOOGLE_API_KEY not set"))?,
            model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash-exp".to_string()),
        })
    }
}

/// Gemini API client.
pub struct GeminiModel {
    config: GeminiConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    Text(String),
    InlineData(InlineData),
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

impl GeminiModel {
    /// Create a new Gemini client.
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> VisionResult<Self> {
        Ok(Self::new(GeminiConfig::from_env()?))
    }

    fn encode_parts(parts: Vec<PromptPart>) -> Vec<Part> {
        parts
            .into_iter()
            .map(|part| match part {
                PromptPart::Text(text) => Part::Text(text),
                PromptPart::ImagePng(bytes) => Part::InlineData(InlineData {
                    mime_type: "image/png".to_string(),
                    data: base64::engine::general_purpose::STANDARD.encode(bytes),
                }),
            })
            .collect()
    }
}

#[async_trait]
impl GenerativeModel for GeminiModel {
    async fn generate(
        &self,
        system_instruction: Option<&str>,
        parts: Vec<PromptPart>,
    ) -> VisionResult<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.config.model, self.config.api_key
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: Self::encode_parts(parts),
            }],
            system_instruction: system_instruction.map(|text| Content {
                parts: vec![Part::Text(text.to_string())],
            }),
        };

        debug!(model = %self.config.model, "Calling Gemini API");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| VisionError::model_failed(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VisionError::model_failed(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            VisionError::model_failed(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim())
            .filter(|t| !t.is_empty())
            .ok_or(VisionError::EmptyResponse)?;

        Ok(text.to_string())
    }
}
