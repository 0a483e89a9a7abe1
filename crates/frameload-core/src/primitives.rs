//! # Engine Primitives
//!
//! Fixed constants shared by resources and bundles.

/// Name prefix for background gather worker threads.
///
/// Workers are named `<prefix>-<label>` so they can be told apart in a
/// debugger or profiler.
pub const DEFAULT_THREAD_PREFIX: &str = "frameload-gather";

/// Longest label suffix appended to a worker thread name.
///
/// Some platforms truncate or reject long thread names.
pub const MAX_THREAD_LABEL: usize = 32;

/// Ticks a full load session needs per resource at minimum in incremental mode:
/// one tick to do the work, one to observe it finished.
pub const TICKS_PER_STEP: usize = 2;
