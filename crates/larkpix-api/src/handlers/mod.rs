//! HTTP request handlers.

pub mod callback;
pub mod generate;
pub mod health;
