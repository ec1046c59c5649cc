//! The publish pipeline: acquire an asset, authenticate, upload, resolve a
//! temporary link.
//!
//! Strictly linear; each stage is a prerequisite for the next and the first
//! failure aborts the run. Per-stage wall-clock timings are recorded for
//! observability only.

use std::time::Instant;

use anyhow::Result;

use larkpix_core::{
    Config, GenerationRequest, PipelineStage, PublishError, PublishOutcome, RawAsset, StageTimings,
};

use crate::gemini::GeminiClient;
use crate::lark::LarkClient;
use crate::source::{decode_inline, SourceFetcher};

/// Sequences the acquisition, auth, upload, and link-resolution stages.
/// One instance is shared by all entry shells; per-run state lives on the
/// stack of [`Publisher::publish`].
#[derive(Debug, Clone)]
pub struct Publisher {
    gemini: GeminiClient,
    lark: LarkClient,
    fetcher: SourceFetcher,
    parent_node: String,
    parent_type: String,
}

impl Publisher {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            gemini: GeminiClient::new(
                config.gemini_base_url(),
                config.gemini_api_key(),
                config.gemini_model(),
            )?,
            lark: LarkClient::new(
                config.lark_base_url(),
                config.lark_app_id(),
                config.lark_app_secret(),
            )?,
            fetcher: SourceFetcher::new(config.source_fetch_timeout_secs())?,
            parent_node: config.parent_node().to_string(),
            parent_type: config.parent_type().to_string(),
        })
    }

    /// Run the full pipeline for one request.
    ///
    /// Acquisition precedence: an inline base64 payload is decoded directly
    /// and bypasses generation; otherwise the generation backend is invoked,
    /// with the source image (when a URL is given) fetched first and fed in
    /// as an inline input part.
    #[tracing::instrument(skip(self, request), fields(has_inline = request.image.is_some(), has_image_url = request.image_url.is_some()))]
    pub async fn publish(
        &self,
        request: GenerationRequest,
    ) -> Result<PublishOutcome, PublishError> {
        let request = request.normalized();
        let mut timings = StageTimings::default();

        let started = Instant::now();
        let asset = self.acquire(&request).await?;
        timings.acquire_ms = started.elapsed().as_millis();
        tracing::info!(
            stage = %PipelineStage::Acquiring,
            size = asset.size(),
            elapsed_ms = timings.acquire_ms,
            "Asset acquired"
        );

        let started = Instant::now();
        let token = self.lark.tenant_access_token().await?;
        timings.auth_ms = started.elapsed().as_millis();
        tracing::info!(
            stage = %PipelineStage::Authenticating,
            elapsed_ms = timings.auth_ms,
            "Tenant access token obtained"
        );

        let started = Instant::now();
        let file_token = self
            .lark
            .upload_media(&token, &asset, &self.parent_node, &self.parent_type)
            .await?;
        timings.upload_ms = started.elapsed().as_millis();
        tracing::info!(
            stage = %PipelineStage::Uploading,
            file_token = %file_token,
            elapsed_ms = timings.upload_ms,
            "Asset uploaded"
        );

        let started = Instant::now();
        let download_url = self.lark.tmp_download_url(&token, &file_token).await?;
        timings.link_ms = started.elapsed().as_millis();
        tracing::info!(
            stage = %PipelineStage::ResolvingLink,
            elapsed_ms = timings.link_ms,
            total_ms = timings.total_ms(),
            "Download link resolved"
        );

        Ok(PublishOutcome {
            file_token,
            download_url,
            timings: Some(timings),
        })
    }

    async fn acquire(&self, request: &GenerationRequest) -> Result<RawAsset, PublishError> {
        if let Some(payload) = &request.image {
            return decode_inline(payload);
        }

        let input_image = match &request.image_url {
            Some(url) => Some(self.fetcher.fetch(url).await?),
            None => None,
        };

        self.gemini.generate(request, input_image.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::encode_inline;
    use larkpix_core::Config;

    const TOKEN_BODY: &str = r#"{"code": 0, "tenant_access_token": "t-run"}"#;
    const UPLOAD_BODY: &str = r#"{"code": 0, "data": {"file_token": "boxcnRun"}}"#;

    fn link_body(url: &str) -> String {
        format!(
            r#"{{"code": 0, "data": {{"tmp_download_urls": [{{"tmp_download_url": "{}"}}]}}}}"#,
            url
        )
    }

    fn publisher_for(gemini_url: &str, lark_url: &str) -> Publisher {
        let config = Config::for_testing(gemini_url, lark_url, "key", "app", "secret", "node");
        Publisher::new(&config).unwrap()
    }

    /// Gemini mock body with a single inline image part.
    fn generation_body(bytes: &[u8]) -> String {
        serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{ "inlineData": { "mimeType": "image/png", "data": encode_inline(bytes) } }]
                }
            }]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_inline_payload_bypasses_generation() {
        let mut gemini = mockito::Server::new_async().await;
        let mut lark = mockito::Server::new_async().await;

        // The generation backend must never be called for inline payloads.
        let gen_mock = gemini
            .mock("POST", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        lark.mock("POST", "/open-apis/auth/v3/tenant_access_token/internal")
            .with_status(200)
            .with_body(TOKEN_BODY)
            .create_async()
            .await;
        lark.mock("POST", "/open-apis/drive/v1/medias/upload_all")
            .with_status(200)
            .with_body(UPLOAD_BODY)
            .create_async()
            .await;
        lark.mock(
            "GET",
            "/open-apis/drive/v1/medias/batch_get_tmp_download_url",
        )
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(link_body("https://internal-api/dl/inline"))
        .create_async()
        .await;

        let publisher = publisher_for(&gemini.url(), &lark.url());
        let outcome = publisher
            .publish(GenerationRequest::from_inline(encode_inline(b"raw png")))
            .await
            .unwrap();

        gen_mock.assert_async().await;
        assert_eq!(outcome.file_token, "boxcnRun");
        assert_eq!(outcome.download_url, "https://internal-api/dl/inline");
        assert!(outcome.timings.is_some());
    }

    #[tokio::test]
    async fn test_malformed_inline_fails_before_any_network_call() {
        let mut gemini = mockito::Server::new_async().await;
        let mut lark = mockito::Server::new_async().await;
        let gen_mock = gemini
            .mock("POST", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let lark_mock = lark
            .mock("POST", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let publisher = publisher_for(&gemini.url(), &lark.url());
        let err = publisher
            .publish(GenerationRequest::from_inline("####"))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Decode(_)));
        assert_eq!(err.stage(), PipelineStage::Acquiring);
        gen_mock.assert_async().await;
        lark_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_url_and_prompt_end_to_end() {
        let mut gemini = mockito::Server::new_async().await;
        let mut lark = mockito::Server::new_async().await;
        let mut source = mockito::Server::new_async().await;

        let source_mock = source
            .mock("GET", "/pic.jpg")
            .with_status(200)
            .with_header("content-type", "image/jpeg")
            .with_body(vec![0xffu8, 0xd8])
            .create_async()
            .await;
        let gen_mock = gemini
            .mock(
                "POST",
                "/v1beta/models/gemini-3-pro-image-preview:generateContent",
            )
            // The fetched source image must travel inside the request.
            .match_body(mockito::Matcher::PartialJsonString(format!(
                r#"{{"contents":[{{"parts":[{{"inlineData":{{"mimeType":"image/jpeg","data":"{}"}}}},{{"text":"make background white"}}]}}]}}"#,
                encode_inline(&[0xffu8, 0xd8])
            )))
            .with_status(200)
            .with_body(generation_body(b"\x89PNG generated"))
            .create_async()
            .await;
        lark.mock("POST", "/open-apis/auth/v3/tenant_access_token/internal")
            .with_status(200)
            .with_body(TOKEN_BODY)
            .create_async()
            .await;
        lark.mock("POST", "/open-apis/drive/v1/medias/upload_all")
            .with_status(200)
            .with_body(UPLOAD_BODY)
            .create_async()
            .await;
        lark.mock(
            "GET",
            "/open-apis/drive/v1/medias/batch_get_tmp_download_url",
        )
        .match_query(mockito::Matcher::UrlEncoded(
            "file_tokens".into(),
            "boxcnRun".into(),
        ))
        .with_status(200)
        .with_body(link_body("https://internal-api/dl/generated"))
        .create_async()
        .await;

        let mut request = GenerationRequest::from_prompt("make background white");
        request.image_url = Some(format!("{}/pic.jpg", source.url()));

        let publisher = publisher_for(&gemini.url(), &lark.url());
        let outcome = publisher.publish(request).await.unwrap();

        source_mock.assert_async().await;
        gen_mock.assert_async().await;
        assert!(outcome.download_url.starts_with("https://"));
        assert_eq!(outcome.file_token, "boxcnRun");
    }

    #[tokio::test]
    async fn test_generation_failure_skips_upload() {
        let mut gemini = mockito::Server::new_async().await;
        let mut lark = mockito::Server::new_async().await;

        gemini
            .mock(
                "POST",
                "/v1beta/models/gemini-3-pro-image-preview:generateContent",
            )
            .with_status(200)
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;
        let lark_mock = lark
            .mock("POST", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let publisher = publisher_for(&gemini.url(), &lark.url());
        let err = publisher
            .publish(GenerationRequest::from_prompt("a cat"))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Generation(_)));
        lark_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_auth_failure_skips_upload() {
        let mut gemini = mockito::Server::new_async().await;
        let mut lark = mockito::Server::new_async().await;

        gemini
            .mock(
                "POST",
                "/v1beta/models/gemini-3-pro-image-preview:generateContent",
            )
            .with_status(200)
            .with_body(generation_body(b"png"))
            .create_async()
            .await;
        lark.mock("POST", "/open-apis/auth/v3/tenant_access_token/internal")
            .with_status(403)
            .with_body("forbidden")
            .create_async()
            .await;
        let upload_mock = lark
            .mock("POST", "/open-apis/drive/v1/medias/upload_all")
            .expect(0)
            .create_async()
            .await;

        let publisher = publisher_for(&gemini.url(), &lark.url());
        let err = publisher
            .publish(GenerationRequest::from_prompt("a cat"))
            .await
            .unwrap_err();

        assert_eq!(err.stage(), PipelineStage::Authenticating);
        upload_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_link_failure_reports_whole_pipeline_failure() {
        let mut gemini = mockito::Server::new_async().await;
        let mut lark = mockito::Server::new_async().await;

        gemini
            .mock(
                "POST",
                "/v1beta/models/gemini-3-pro-image-preview:generateContent",
            )
            .with_status(200)
            .with_body(generation_body(b"png"))
            .create_async()
            .await;
        lark.mock("POST", "/open-apis/auth/v3/tenant_access_token/internal")
            .with_status(200)
            .with_body(TOKEN_BODY)
            .create_async()
            .await;
        lark.mock("POST", "/open-apis/drive/v1/medias/upload_all")
            .with_status(200)
            .with_body(UPLOAD_BODY)
            .create_async()
            .await;
        lark.mock(
            "GET",
            "/open-apis/drive/v1/medias/batch_get_tmp_download_url",
        )
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"{"code": 0, "data": {"tmp_download_urls": []}}"#)
        .create_async()
        .await;

        let publisher = publisher_for(&gemini.url(), &lark.url());
        let err = publisher
            .publish(GenerationRequest::from_prompt("a cat"))
            .await
            .unwrap_err();

        // Upload succeeded, but the run as a whole fails; no rollback.
        assert!(matches!(err, PublishError::EmptyLinkSet));
        assert_eq!(err.stage(), PipelineStage::ResolvingLink);
    }
}
