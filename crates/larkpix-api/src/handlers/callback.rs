//! Workflow-callback handler.
//!
//! Workflow engines treat any non-2xx response as a step crash, so this
//! shell always answers HTTP 200: a success body on success, a
//! `{code, msg}` envelope on failure.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use larkpix_core::GenerationRequest;

use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CallbackRequest {
    /// Base64-encoded image payload.
    pub image: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum CallbackResponse {
    Success {
        file_token: String,
        download_url: String,
        status: String,
    },
    Failure {
        code: i64,
        msg: String,
    },
}

/// Decode an inline base64 payload and publish it.
#[utoipa::path(
    post,
    path = "/callback",
    tag = "publish",
    request_body = CallbackRequest,
    responses(
        (status = 200, description = "Outcome envelope (success or {code, msg})", body = CallbackResponse)
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CallbackRequest>,
) -> Json<CallbackResponse> {
    if request.image.trim().is_empty() {
        return Json(CallbackResponse::Failure {
            code: -1,
            msg: "empty image payload".to_string(),
        });
    }

    match state
        .publisher
        .publish(GenerationRequest::from_inline(request.image))
        .await
    {
        Ok(outcome) => Json(CallbackResponse::Success {
            file_token: outcome.file_token,
            download_url: outcome.download_url,
            status: "success".to_string(),
        }),
        Err(err) => {
            tracing::error!(error = %err, stage = %err.stage(), "Workflow publish failed");
            Json(CallbackResponse::Failure {
                code: err.workflow_code(),
                msg: err.to_string(),
            })
        }
    }
}
