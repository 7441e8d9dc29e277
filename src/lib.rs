//! repo-harvest crate
//!
//! Collects README text and FAIR-compliance indicators for large batches of repository URLs
//! while staying inside the hosting API's rate limits. The binary is a thin shell around
//! [`commands::run`]; the library is exposed so integration tests can drive the batch pipeline
//! directly.

/// Result type alias using `ohno::AppError` as the default error type.
pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod commands;
pub mod facts;
pub mod reports;

pub use crate::commands::{Host, run};
