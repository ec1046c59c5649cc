//! Asset acquisition helpers: inline base64 decoding and source-image
//! download.
//!
//! Decoding is padding-indifferent because workflow senders routinely strip
//! trailing `=`. A decode failure is a caller mistake and must surface
//! before any network call is made.

use std::time::Duration;

use anyhow::{Context, Result};
use base64::alphabet;
use base64::engine::general_purpose::GeneralPurpose;
use base64::engine::{DecodePaddingMode, GeneralPurposeConfig};
use base64::Engine;
use larkpix_core::models::INLINE_FILENAME;
use larkpix_core::{PublishError, RawAsset};

/// Standard alphabet, canonical or absent padding both accepted.
pub(crate) const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const FALLBACK_CONTENT_TYPE: &str = "image/jpeg";

/// Decode an inline base64 payload into a raw asset.
pub fn decode_inline(payload: &str) -> Result<RawAsset, PublishError> {
    let bytes = LENIENT_STANDARD
        .decode(payload.trim())
        .map_err(|e| PublishError::Decode(e.to_string()))?;
    Ok(RawAsset::new(bytes, "image/png", INLINE_FILENAME))
}

/// Encode raw bytes for an inline request part.
pub fn encode_inline(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// An image fetched from a remote URL, ready to embed as a generation
/// input part.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// Downloads source images over HTTP with a bounded timeout.
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    http_client: reqwest::Client,
}

impl SourceFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client for source-image fetch")?;
        Ok(Self { http_client })
    }

    /// Fetch a source image. Non-2xx or transport errors fail with
    /// [`PublishError::Fetch`]; a non-image declared content type is
    /// coerced to `image/jpeg`.
    pub async fn fetch(&self, url: &str) -> Result<FetchedImage, PublishError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| PublishError::Fetch(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Fetch(format!(
                "{} returned status {}",
                url, status
            )));
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|ct| ct.starts_with("image/"))
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PublishError::Fetch(format!("{}: {}", url, e)))?
            .to_vec();

        let filename = url_basename(url);

        tracing::debug!(
            url = %url,
            size = bytes.len(),
            mime_type = %mime_type,
            "Fetched source image"
        );

        Ok(FetchedImage {
            mime_type,
            bytes,
            filename,
        })
    }
}

fn url_basename(url: &str) -> String {
    url.split('?')
        .next()
        .and_then(|path| path.rsplit('/').next())
        .filter(|name| !name.is_empty() && name.contains('.'))
        .unwrap_or("image.jpg")
        .to_string()
}
