//! Core types for the larkpix image publishing pipeline.
//!
//! Provides the configuration surface, the pipeline error taxonomy, and the
//! domain models shared by the service clients and every entry shell.

pub mod config;
pub mod error;
pub mod models;

pub use config::Config;
pub use error::{PipelineStage, PublishError};
pub use models::{GenerationRequest, PublishOutcome, RawAsset, StageTimings};
