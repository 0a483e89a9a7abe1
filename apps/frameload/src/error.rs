//! # Application Errors
//!
//! Everything the CLI can fail with. Scheduler misuse from the core is
//! wrapped as-is; resource-level failures never surface here, they are
//! reported per asset in session reports.

use frameload_core::LoadError;
use thiserror::Error;

/// Errors returned by frameload commands.
#[derive(Debug, Error)]
pub enum AppError {
    /// The manifest could not be parsed or failed validation.
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// A bundle was driven out of order.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Report output could not be produced.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}
