//! Generate-and-publish handler.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use larkpix_core::GenerationRequest;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct GenerateResponse {
    pub status: String,
    pub download_url: String,
    pub file_token: String,
}

/// Run the full pipeline for an API request.
///
/// The request either carries an inline base64 `image` (uploaded as-is),
/// or a `prompt` with an optional `imageUrl` fed to the generation
/// backend. The response is the temporary download link plus the Drive
/// file token.
#[utoipa::path(
    post,
    path = "/generate",
    tag = "publish",
    request_body = GenerationRequest,
    responses(
        (status = 200, description = "Image published", body = GenerateResponse),
        (status = 400, description = "Invalid payload or unreachable source image", body = ErrorResponse),
        (status = 422, description = "Generation returned no image (content policy)", body = ErrorResponse),
        (status = 502, description = "Backend failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(model = %request.model))]
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GenerateResponse>, HttpAppError> {
    if request.image.is_none() && request.prompt.trim().is_empty() {
        return Err(HttpAppError::BadRequest(
            "prompt must not be empty unless an inline image is supplied".to_string(),
        ));
    }

    let outcome = state.publisher.publish(request).await?;

    Ok(Json(GenerateResponse {
        status: "success".to_string(),
        download_url: outcome.download_url,
        file_token: outcome.file_token,
    }))
}
