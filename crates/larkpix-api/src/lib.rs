//! larkpix HTTP service.
//!
//! Thin shell over [`larkpix_services::Publisher`]: request bodies are
//! translated into a `GenerationRequest`, the pipeline outcome back into
//! the caller's response envelope.

mod api_doc;
mod handlers;

pub mod error;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use error::ErrorResponse;
pub use state::AppState;
