//! # frameload
//!
//! Command-line driver for the `frameload-core` scheduler: reads a TOML
//! manifest of assets, wraps each in a resource, and drives load and unload
//! sessions on a frame clock.
//!
//! ## Modules
//!
//! - `manifest` - TOML manifest format and validation
//! - `assets` - file, inline and synthetic asset kinds, simulated device
//! - `driver` - frame-paced session driver and session reports
//! - `error` - application error type

pub mod assets;
pub mod driver;
pub mod error;
pub mod manifest;

pub use error::AppError;
