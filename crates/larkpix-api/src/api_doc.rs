//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use larkpix_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "larkpix API",
        version = "0.1.0",
        description = "Generates or accepts a single image, publishes it to Lark Drive, and returns a temporary download URL."
    ),
    paths(
        handlers::generate::generate,
        handlers::callback::callback,
        handlers::health::health_check,
        handlers::health::root,
    ),
    components(schemas(
        models::GenerationRequest,
        handlers::generate::GenerateResponse,
        handlers::callback::CallbackRequest,
        handlers::callback::CallbackResponse,
        handlers::health::HealthResponse,
        handlers::health::RootResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "publish", description = "Image publishing pipeline"),
        (name = "status", description = "Status probes")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
