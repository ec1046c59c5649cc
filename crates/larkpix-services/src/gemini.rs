//! Gemini generateContent client for image generation.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;

use larkpix_core::models::{resolve_model_alias, GENERATED_FILENAME};
use larkpix_core::{GenerationRequest, PublishError, RawAsset};

use crate::source::{encode_inline, FetchedImage, LENIENT_STANDARD};
use base64::Engine;

const REQUEST_TIMEOUT_SECS: u64 = 120;
const FALLBACK_IMAGE_MIME: &str = "image/png";

/// Client for the Gemini generateContent endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    default_model: String,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        default_model: impl Into<String>,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client for Gemini API")?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            default_model: default_model.into(),
        })
    }

    /// Generate an image from the request prompt, optionally conditioned on
    /// a fetched source image embedded as an inline part.
    ///
    /// Zero candidates fail with [`PublishError::Generation`]; a candidate
    /// without image data fails with [`PublishError::NoImage`] so callers
    /// can tell a content-policy rejection from an outage.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        input_image: Option<&FetchedImage>,
    ) -> Result<RawAsset, PublishError> {
        let model = resolve_model_alias(&request.model, &self.default_model);
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);

        // Input image first so the prompt refers to it, matching the
        // multimodal ordering the backend expects.
        let mut parts = Vec::new();
        if let Some(image) = input_image {
            parts.push(json!({
                "inlineData": {
                    "mimeType": image.mime_type,
                    "data": encode_inline(&image.bytes),
                }
            }));
        }
        parts.push(json!({ "text": request.prompt }));

        let payload = json!({
            "contents": [{ "parts": parts }],
            "tools": [{ "google_search": {} }],
            "generationConfig": {
                "responseModalities": ["TEXT", "IMAGE"],
                "imageConfig": {
                    "aspectRatio": request.aspect_ratio,
                    "imageSize": request.image_size,
                }
            }
        });

        tracing::info!(model = %model, with_input_image = input_image.is_some(), "Requesting image generation");

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| PublishError::Generation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PublishError::Generation(format!(
                "backend returned status {}: {}",
                status, body
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Generation(format!("malformed response: {}", e)))?;

        let candidates = body.candidates.unwrap_or_default();
        let Some(first) = candidates.into_iter().next() else {
            return Err(PublishError::Generation(
                "backend returned no candidates".to_string(),
            ));
        };

        let parts = first
            .content
            .and_then(|c| c.parts)
            .unwrap_or_default();
        // An inlineData part without payload bytes counts as no image; a
        // zero-byte asset must never reach the upload stage.
        let Some((data, mime_type)) = parts.into_iter().find_map(|p| {
            let inline = p.inline_data?;
            let data = inline.data.filter(|d| !d.is_empty())?;
            Some((data, inline.mime_type))
        }) else {
            // Typically the request was filtered by safety policy.
            return Err(PublishError::NoImage);
        };

        let image_bytes = LENIENT_STANDARD
            .decode(&data)
            .map_err(|e| PublishError::Decode(format!("embedded image data: {}", e)))?;

        let content_type = mime_type
            .filter(|m| m.starts_with("image/"))
            .unwrap_or_else(|| FALLBACK_IMAGE_MIME.to_string());

        tracing::info!(size = image_bytes.len(), content_type = %content_type, "Image generated");

        Ok(RawAsset::new(image_bytes, content_type, GENERATED_FILENAME))
    }
}

// Gemini generateContent response types (Option-heavy: the backend omits
// whole subtrees for filtered or text-only candidates).
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(rename = "inlineData")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: Option<String>,
    data: Option<String>,
}
