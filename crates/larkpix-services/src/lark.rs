//! Lark (Feishu) open-platform client: tenant token exchange, Drive media
//! upload, and temporary download-link resolution.
//!
//! Lark wraps application-level results in a `{code, msg, data}` envelope;
//! HTTP 200 with a non-zero code is a semantic rejection and must never be
//! treated as success.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;

use larkpix_core::{PublishError, RawAsset};

const REQUEST_TIMEOUT_SECS: u64 = 60;

const TOKEN_PATH: &str = "/open-apis/auth/v3/tenant_access_token/internal";
const UPLOAD_PATH: &str = "/open-apis/drive/v1/medias/upload_all";
const LINK_PATH: &str = "/open-apis/drive/v1/medias/batch_get_tmp_download_url";

/// Adler-32 over the raw asset bytes, submitted with the upload for
/// backend-side integrity verification.
pub fn adler32_checksum(bytes: &[u8]) -> u32 {
    let mut hasher = adler2::Adler32::new();
    hasher.write_slice(bytes);
    hasher.checksum()
}

/// Client for the Lark open APIs used by the pipeline.
#[derive(Debug, Clone)]
pub struct LarkClient {
    http_client: reqwest::Client,
    base_url: String,
    app_id: String,
    app_secret: String,
}

impl LarkClient {
    pub fn new(
        base_url: impl Into<String>,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client for Lark API")?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        })
    }

    /// Exchange the application identity for a tenant access token.
    ///
    /// Always fetched fresh; the token's expiry is enforced by the backend
    /// and deliberately not tracked here.
    pub async fn tenant_access_token(&self) -> Result<String, PublishError> {
        let url = format!("{}{}", self.base_url, TOKEN_PATH);
        let payload = json!({
            "app_id": self.app_id,
            "app_secret": self.app_secret,
        });

        let response = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json; charset=utf-8")
            .json(&payload)
            .send()
            .await
            .map_err(|e| PublishError::Auth(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PublishError::Auth(format!(
                "token endpoint returned status {}: {}",
                status, body
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Auth(format!("malformed token response: {}", e)))?;

        if body.code.unwrap_or(0) != 0 {
            return Err(PublishError::Auth(format!(
                "token endpoint returned code {}: {}",
                body.code.unwrap_or_default(),
                body.msg.unwrap_or_default()
            )));
        }

        body.tenant_access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PublishError::Auth("response carried no tenant_access_token".into()))
    }

    /// Upload a raw asset to Drive under the fixed destination container.
    /// Returns the opaque `file_token` handle.
    pub async fn upload_media(
        &self,
        token: &str,
        asset: &RawAsset,
        parent_node: &str,
        parent_type: &str,
    ) -> Result<String, PublishError> {
        let url = format!("{}{}", self.base_url, UPLOAD_PATH);
        let checksum = adler32_checksum(&asset.bytes);

        let file_part = reqwest::multipart::Part::bytes(asset.bytes.to_vec())
            .file_name(asset.filename.clone())
            .mime_str(&asset.content_type)
            .map_err(|e| PublishError::Upload {
                status: 0,
                body: format!("invalid content type {}: {}", asset.content_type, e),
            })?;

        let form = reqwest::multipart::Form::new()
            .text("file_name", asset.filename.clone())
            .text("parent_type", parent_type.to_string())
            .text("parent_node", parent_node.to_string())
            .text("size", asset.size().to_string())
            .text("checksum", checksum.to_string())
            .part("file", file_part);

        tracing::info!(
            file_name = %asset.filename,
            size = asset.size(),
            checksum,
            parent_type = %parent_type,
            "Uploading asset to Lark Drive"
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PublishError::Upload {
                status: 0,
                body: e.to_string(),
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if !status.is_success() {
            return Err(PublishError::Upload {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: UploadResponse =
            serde_json::from_str(&text).map_err(|_| PublishError::Upload {
                status: status.as_u16(),
                body: format!("malformed upload response: {}", text),
            })?;

        if envelope.code != 0 {
            return Err(PublishError::UploadRejected {
                code: envelope.code,
                msg: envelope.msg.unwrap_or_else(|| text.clone()),
            });
        }

        envelope
            .data
            .and_then(|d| d.file_token)
            .filter(|t| !t.is_empty())
            .ok_or(PublishError::UploadRejected {
                code: 0,
                msg: "zero-code envelope carried no file_token".to_string(),
            })
    }

    /// Resolve a temporary download URL for an uploaded asset.
    ///
    /// The batch endpoint is queried for a single handle; a zero-code
    /// envelope with an empty URL list is handled explicitly rather than
    /// indexed.
    pub async fn tmp_download_url(
        &self,
        token: &str,
        file_token: &str,
    ) -> Result<String, PublishError> {
        let url = format!("{}{}", self.base_url, LINK_PATH);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token)
            .query(&[("file_tokens", file_token)])
            .send()
            .await
            .map_err(|e| PublishError::Link(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PublishError::Link(format!(
                "link endpoint returned status {}: {}",
                status, body
            )));
        }

        let envelope: LinkResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Link(format!("malformed link response: {}", e)))?;

        if envelope.code != 0 {
            return Err(PublishError::Link(format!(
                "link endpoint returned code {}: {}",
                envelope.code,
                envelope.msg.unwrap_or_default()
            )));
        }

        envelope
            .data
            .map(|d| d.tmp_download_urls)
            .unwrap_or_default()
            .into_iter()
            .find_map(|entry| entry.tmp_download_url)
            .filter(|u| !u.is_empty())
            .ok_or(PublishError::EmptyLinkSet)
    }
}

// Lark response envelopes

#[derive(Debug, Deserialize)]
struct TokenResponse {
    code: Option<i64>,
    msg: Option<String>,
    tenant_access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    code: i64,
    msg: Option<String>,
    data: Option<UploadData>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    file_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LinkResponse {
    #[serde(default)]
    code: i64,
    msg: Option<String>,
    data: Option<LinkData>,
}

#[derive(Debug, Deserialize)]
struct LinkData {
    #[serde(default)]
    tmp_download_urls: Vec<LinkEntry>,
}

#[derive(Debug, Deserialize)]
struct LinkEntry {
    tmp_download_url: Option<String>,
}
