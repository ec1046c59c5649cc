//! Route configuration and setup.

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::api_doc;
use crate::handlers;
use crate::state::AppState;

/// Upper bound on request bodies; inline base64 payloads inflate the
/// original image by ~4/3.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Setup all application routes.
pub fn setup_routes(state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(&state)?;

    let app = Router::new()
        .route("/generate", post(handlers::generate::generate))
        .route("/callback", post(handlers::callback::callback))
        .route("/health", get(handlers::health::health_check))
        .route("/", get(handlers::health::root))
        .route(
            "/api/openapi.json",
            get(|| async { axum::Json(api_doc::get_openapi_spec()) }),
        )
        .merge(Into::<Router<Arc<AppState>>>::into(
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"),
        ))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration.
fn setup_cors(state: &Arc<AppState>) -> Result<CorsLayer, anyhow::Error> {
    let origins = state.config.cors_origins();
    let cors = if origins.contains(&"*".to_string()) {
        if state.config.is_production() {
            tracing::warn!("CORS configured to allow all origins - not recommended for production");
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let parsed: Result<Vec<HeaderValue>, _> = origins.iter().map(|o| o.parse()).collect();
        CorsLayer::new()
            .allow_origin(parsed.unwrap_or_default())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}
