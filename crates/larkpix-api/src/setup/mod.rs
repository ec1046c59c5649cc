//! Application setup: state construction, routes, server startup.

pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use larkpix_core::Config;

use crate::state::AppState;

/// Build the shared state and the configured router.
pub fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router)> {
    let state = Arc::new(AppState::new(config)?);
    let router = routes::setup_routes(state.clone())?;
    Ok((state, router))
}
