//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`;
//! `PublishError` converts via `?` and renders consistently (status from
//! the error taxonomy, JSON body, logging).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use larkpix_core::PublishError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Pipeline stage the failure occurred in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Backend status/body when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Wrapper implementing `IntoResponse` for pipeline failures plus
/// shell-level request validation.
#[derive(Debug)]
pub enum HttpAppError {
    Pipeline(PublishError),
    BadRequest(String),
}

impl From<PublishError> for HttpAppError {
    fn from(err: PublishError) -> Self {
        HttpAppError::Pipeline(err)
    }
}

impl HttpAppError {
    fn status_code(&self) -> StatusCode {
        match self {
            HttpAppError::Pipeline(err) => StatusCode::from_u16(err.http_status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            HttpAppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            HttpAppError::Pipeline(err) => {
                if status.is_server_error() {
                    tracing::error!(error = %err, stage = %err.stage(), "Pipeline failed");
                } else {
                    tracing::warn!(error = %err, stage = %err.stage(), "Request rejected");
                }
                let details = match err {
                    PublishError::Upload { status, body } => {
                        Some(format!("backend status {}: {}", status, body))
                    }
                    PublishError::UploadRejected { code, msg } => {
                        Some(format!("backend code {}: {}", code, msg))
                    }
                    _ => None,
                };
                ErrorResponse {
                    error: err.to_string(),
                    code: err.error_code().to_string(),
                    stage: Some(err.stage().to_string()),
                    details,
                }
            }
            HttpAppError::BadRequest(msg) => {
                tracing::warn!(error = %msg, "Invalid request");
                ErrorResponse {
                    error: msg.clone(),
                    code: "invalid_input".to_string(),
                    stage: None,
                    details: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_maps_to_400() {
        let err = HttpAppError::from(PublishError::Decode("bad symbol".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_no_image_maps_to_422() {
        let err = HttpAppError::from(PublishError::NoImage);
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_backend_failures_map_to_502() {
        for err in [
            PublishError::Auth("denied".into()),
            PublishError::Upload {
                status: 500,
                body: "boom".into(),
            },
            PublishError::EmptyLinkSet,
        ] {
            assert_eq!(
                HttpAppError::from(err).status_code(),
                StatusCode::BAD_GATEWAY
            );
        }
    }

    /// Serialized ErrorResponse carries "error", "code", and optionally
    /// "stage" / "details".
    #[test]
    fn test_error_response_shape() {
        let response = ErrorResponse {
            error: "Upload rejected by backend (code 7): quota".to_string(),
            code: "upload_rejected_error".to_string(),
            stage: Some("uploading".to_string()),
            details: Some("backend code 7: quota".to_string()),
        };
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["code"], "upload_rejected_error");
        assert_eq!(json["stage"], "uploading");
        assert!(json.get("error").and_then(|v| v.as_str()).is_some());
    }
}
