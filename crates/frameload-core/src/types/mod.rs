//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the loading engine:
//! - Resource status fields (`GatherStatus`, `ProcessStatus`)
//! - Session direction (`Direction`)
//! - Error types (`LoadError`, `AssetError`) and per-resource failure records
//!
//! ## Error Taxonomy
//!
//! - `LoadError` is scheduler misuse: starting a session while one is active,
//!   or advancing a bundle that is idle. The caller is at fault; nothing is retried.
//! - `AssetError` is a resource-level failure raised by a concrete asset. It is
//!   opaque to the scheduler: the resource records it and the pipeline moves on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// RESOURCE STATUS
// =============================================================================

/// Progress of a resource's background fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GatherStatus {
    /// Nothing has been fetched, or the fetched data was discarded.
    Ungathered,
    /// A background fetch is running.
    Gathering,
    /// The fetch finished. The data may still await reconciliation by `join`.
    Gathered,
}

impl GatherStatus {
    /// Get the status name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            GatherStatus::Ungathered => "ungathered",
            GatherStatus::Gathering => "gathering",
            GatherStatus::Gathered => "gathered",
        }
    }
}

/// Progress of a resource's foreground finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProcessStatus {
    /// Not finalized, or unloaded.
    Unprocessed,
    /// Finalized and usable by the target system.
    Processed,
}

impl ProcessStatus {
    /// Get the status name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ProcessStatus::Unprocessed => "unprocessed",
            ProcessStatus::Processed => "processed",
        }
    }
}

impl std::fmt::Display for GatherStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// SESSION DIRECTION
// =============================================================================

/// Which way a loading session moves its resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Gather, process, then optionally clean.
    Load,
    /// Unload, then optionally clean.
    Unload,
}

impl Direction {
    /// Get the direction name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Direction::Load => "load",
            Direction::Unload => "unload",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Scheduler misuse errors.
///
/// These are precondition violations on the caller's side. A bundle that
/// returns one of these has not changed state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// `load` or `unload` was called while a session was still running.
    #[error("A {0} session is already in progress")]
    SessionActive(Direction),

    /// `update` or `quick_update` was called with no session running.
    #[error("No loading session is in progress")]
    NoSession,
}

/// Failures raised by concrete assets while gathering or processing.
///
/// Payloads are plain strings so failures can be cloned into reports and
/// crossed over thread boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    /// Reading the asset's source failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// The asset's source does not exist.
    #[error("Asset source not found: {0}")]
    Missing(String),

    /// The fetched data could not be interpreted.
    #[error("Invalid asset data: {0}")]
    Invalid(String),

    /// Handing the data to the target system failed.
    #[error("Upload failed: {0}")]
    Upload(String),

    /// The background gather panicked.
    #[error("Gather panicked: {0}")]
    GatherPanicked(String),

    /// The worker thread for a background gather could not be started.
    #[error("Could not spawn gather worker: {0}")]
    Spawn(String),
}

impl From<std::io::Error> for AssetError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => AssetError::Missing(err.to_string()),
            _ => AssetError::Io(err.to_string()),
        }
    }
}

/// A resource that finished its session step with a recorded error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadFailure {
    /// Position of the resource in its bundle.
    pub index: usize,
    /// The resource's label.
    pub label: String,
    /// What went wrong.
    #[serde(serialize_with = "serialize_display")]
    pub error: AssetError,
}

fn serialize_display<S: serde::Serializer>(
    error: &AssetError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

// =============================================================================
// TESTS
// =============================================================================
