//! Domain models for one pipeline run.
//!
//! Nothing here outlives a single invocation: assets stay in process
//! memory, tokens are fetched fresh, and the outcome is handed straight
//! back to the calling shell.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Default filename for a backend-generated asset.
pub const GENERATED_FILENAME: &str = "generated.png";
/// Default filename for an asset decoded from an inline workflow payload.
pub const INLINE_FILENAME: &str = "input_image.png";

/// User-facing model aliases mapped to the actual API model. Unknown
/// aliases fall back to the configured default.
const MODEL_ALIASES: &[(&str, &str)] = &[
    ("nano banana1", "gemini-3-pro-image-preview"),
    ("nano banana2", "gemini-3-pro-image-preview"),
    ("default", "gemini-3-pro-image-preview"),
];

/// Resolve a caller-supplied model alias to an API model name.
pub fn resolve_model_alias<'a>(alias: &'a str, default_model: &'a str) -> &'a str {
    MODEL_ALIASES
        .iter()
        .find(|(name, _)| *name == alias)
        .map(|(_, model)| *model)
        .unwrap_or(default_model)
}

/// Raw image bytes plus a MIME-type hint and a filename. Ephemeral.
#[derive(Debug, Clone)]
pub struct RawAsset {
    pub bytes: Bytes,
    pub content_type: String,
    pub filename: String,
}

impl RawAsset {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
            filename: filename.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Caller-supplied generation parameters, normalized on construction and
/// immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Remote image to fetch and feed to the generation backend.
    #[serde(default, rename = "imageUrl")]
    pub image_url: Option<String>,
    /// Inline base64 payload; takes precedence over everything else and
    /// bypasses generation entirely.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_aspect_ratio", rename = "aspectRatio")]
    pub aspect_ratio: String,
    /// Corresponds to output clarity ("1K", "2K", ...).
    #[serde(default = "default_image_size", rename = "imageSize")]
    pub image_size: String,
    #[serde(default = "default_model_alias")]
    pub model: String,
}

fn default_aspect_ratio() -> String {
    "1:1".to_string()
}

fn default_image_size() -> String {
    "1K".to_string()
}

fn default_model_alias() -> String {
    "default".to_string()
}

impl GenerationRequest {
    /// Build a prompt-only request with defaults applied.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image_url: None,
            image: None,
            aspect_ratio: default_aspect_ratio(),
            image_size: default_image_size(),
            model: default_model_alias(),
        }
    }

    /// Build a request carrying an inline base64 payload (workflow shell).
    pub fn from_inline(payload: impl Into<String>) -> Self {
        Self {
            image: Some(payload.into()),
            ..Self::from_prompt("")
        }
    }

    /// Normalize in place: trim fields and fill empty hints with defaults.
    /// Model alias resolution happens against the configured default at
    /// client construction, not here.
    pub fn normalized(mut self) -> Self {
        self.prompt = self.prompt.trim().to_string();
        if self.aspect_ratio.trim().is_empty() {
            self.aspect_ratio = default_aspect_ratio();
        }
        if self.image_size.trim().is_empty() {
            self.image_size = default_image_size();
        }
        if self.model.trim().is_empty() {
            self.model = default_model_alias();
        }
        self.image_url = self.image_url.filter(|u| !u.trim().is_empty());
        self.image = self.image.filter(|p| !p.trim().is_empty());
        self
    }
}

/// Wall-clock duration per pipeline stage, in milliseconds. Observability
/// only; never affects control flow.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StageTimings {
    pub acquire_ms: u128,
    pub auth_ms: u128,
    pub upload_ms: u128,
    pub link_ms: u128,
}

impl StageTimings {
    pub fn total_ms(&self) -> u128 {
        self.acquire_ms + self.auth_ms + self.upload_ms + self.link_ms
    }
}

/// Terminal artifact of a successful pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    /// Opaque backend-issued identifier for the uploaded file.
    pub file_token: String,
    /// Time-boxed URL granting temporary read access to the asset.
    pub download_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timings: Option<StageTimings>,
}
