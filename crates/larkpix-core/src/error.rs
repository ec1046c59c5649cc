//! Error types module
//!
//! The pipeline is a linear state machine; every failure is terminal and is
//! represented by one `PublishError` variant. Each variant knows the stage
//! it belongs to, a machine-readable code, and the HTTP status the service
//! shell should answer with. Backend status/body details are carried where
//! available for diagnostics.

use std::fmt;

/// The pipeline stage a failure occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Acquiring,
    Authenticating,
    Uploading,
    ResolvingLink,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Acquiring => "acquiring",
            PipelineStage::Authenticating => "authenticating",
            PipelineStage::Uploading => "uploading",
            PipelineStage::ResolvingLink => "resolving_link",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Inline payload or backend-embedded image data is not valid base64.
    #[error("Base64 decode failed: {0}")]
    Decode(String),

    /// Source-image download failed (non-2xx status or transport error).
    #[error("Failed to download input image: {0}")]
    Fetch(String),

    /// Generation backend returned an error or an empty candidate list.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Generation succeeded at the transport level but no response part
    /// carried image data. Usually a content-policy rejection, not an
    /// outage, so it is surfaced distinctly from transport failures.
    #[error("No image data found in generation response")]
    NoImage,

    /// Token exchange failed (non-2xx, malformed body, or missing token).
    #[error("Failed to obtain tenant access token: {0}")]
    Auth(String),

    /// Upload failed at the transport level. `status` is 0 when no HTTP
    /// response was received at all.
    #[error("Upload failed with status {status}: {body}")]
    Upload { status: u16, body: String },

    /// Upload was accepted over HTTP but rejected by the backend envelope
    /// (quota, checksum mismatch, ...). `code` is the backend code.
    #[error("Upload rejected by backend (code {code}): {msg}")]
    UploadRejected { code: i64, msg: String },

    /// Link resolution failed (transport error or non-zero envelope code).
    #[error("Failed to resolve download link: {0}")]
    Link(String),

    /// Link resolution returned a zero-code envelope with no URLs.
    #[error("Backend returned no download links for the uploaded asset")]
    EmptyLinkSet,
}

impl PublishError {
    /// The stage this error belongs to.
    pub fn stage(&self) -> PipelineStage {
        match self {
            PublishError::Decode(_)
            | PublishError::Fetch(_)
            | PublishError::Generation(_)
            | PublishError::NoImage => PipelineStage::Acquiring,
            PublishError::Auth(_) => PipelineStage::Authenticating,
            PublishError::Upload { .. } | PublishError::UploadRejected { .. } => {
                PipelineStage::Uploading
            }
            PublishError::Link(_) | PublishError::EmptyLinkSet => PipelineStage::ResolvingLink,
        }
    }

    /// Machine-readable error code for response envelopes.
    pub fn error_code(&self) -> &'static str {
        match self {
            PublishError::Decode(_) => "decode_error",
            PublishError::Fetch(_) => "fetch_error",
            PublishError::Generation(_) => "generation_error",
            PublishError::NoImage => "no_image_error",
            PublishError::Auth(_) => "auth_error",
            PublishError::Upload { .. } => "upload_error",
            PublishError::UploadRejected { .. } => "upload_rejected_error",
            PublishError::Link(_) => "link_error",
            PublishError::EmptyLinkSet => "empty_link_set_error",
        }
    }

    /// HTTP status code the service shell maps this error to.
    ///
    /// Caller mistakes (bad payload, unreachable source URL) are 4xx;
    /// content-policy rejection is 422; backend failures are 502.
    pub fn http_status_code(&self) -> u16 {
        match self {
            PublishError::Decode(_) | PublishError::Fetch(_) => 400,
            PublishError::NoImage => 422,
            PublishError::Generation(_)
            | PublishError::Auth(_)
            | PublishError::Upload { .. }
            | PublishError::UploadRejected { .. }
            | PublishError::Link(_)
            | PublishError::EmptyLinkSet => 502,
        }
    }

    /// Backend envelope code for the workflow shell: the Lark code when the
    /// backend rejected the request semantically, -1 otherwise.
    pub fn workflow_code(&self) -> i64 {
        match self {
            PublishError::UploadRejected { code, .. } => *code,
            _ => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_attribution() {
        assert_eq!(
            PublishError::Decode("bad".into()).stage(),
            PipelineStage::Acquiring
        );
        assert_eq!(
            PublishError::Auth("denied".into()).stage(),
            PipelineStage::Authenticating
        );
        assert_eq!(
            PublishError::Upload {
                status: 500,
                body: "boom".into()
            }
            .stage(),
            PipelineStage::Uploading
        );
        assert_eq!(
            PublishError::EmptyLinkSet.stage(),
            PipelineStage::ResolvingLink
        );
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(PublishError::Decode("x".into()).http_status_code(), 400);
        assert_eq!(PublishError::Fetch("x".into()).http_status_code(), 400);
        assert_eq!(PublishError::NoImage.http_status_code(), 422);
        assert_eq!(
            PublishError::UploadRejected {
                code: 99991663,
                msg: "quota".into()
            }
            .http_status_code(),
            502
        );
        assert_eq!(PublishError::EmptyLinkSet.http_status_code(), 502);
    }

    #[test]
    fn test_workflow_code_propagates_backend_rejection() {
        let rejected = PublishError::UploadRejected {
            code: 1061002,
            msg: "checksum mismatch".into(),
        };
        assert_eq!(rejected.workflow_code(), 1061002);
        assert_eq!(PublishError::Link("down".into()).workflow_code(), -1);
        assert_eq!(PublishError::Decode("bad".into()).workflow_code(), -1);
    }

    #[test]
    fn test_decode_message_mentions_base64() {
        let err = PublishError::Decode("invalid symbol".into());
        assert!(err.to_string().contains("Base64"));
    }
}
