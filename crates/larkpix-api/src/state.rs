//! Shared application state.

use anyhow::Result;
use larkpix_core::Config;
use larkpix_services::Publisher;

/// Read-only state shared by all handlers: the configuration fixed at
/// startup and the pipeline component. No per-request state is kept here;
/// concurrent requests are fully independent.
pub struct AppState {
    pub config: Config,
    pub publisher: Publisher,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let publisher = Publisher::new(&config)?;
        Ok(Self { config, publisher })
    }
}
