//! # Resource Module
//!
//! A resource is one unit of loadable state with two independent status
//! fields: how far its background fetch got (`GatherStatus`) and whether its
//! foreground finalization ran (`ProcessStatus`).
//!
//! ## Two Traits
//!
//! - [`Asset`] is implemented by concrete resource kinds (textures, shader
//!   programs, buffers). It supplies the custom gather/process/discard/unload work.
//! - [`Loadable`] is the object-safe capability contract stages and bundles
//!   drive. [`Resource<A>`] implements it for any asset and owns the status
//!   machine and the background join handle.
//!
//! ## Background Work
//!
//! `gather()` runs the asset's gather job on a named worker thread. The join
//! handle lives inside the gathering state itself, so the only way out of
//! `Gathering` is `join()`. Discarding, re-gathering, processing and dropping
//! all reconcile an outstanding worker first.

use crate::primitives::{DEFAULT_THREAD_PREFIX, MAX_THREAD_LABEL};
use crate::{AssetError, GatherStatus, ProcessStatus};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

/// Work that fetches an asset's payload. Runs on a worker thread or inline.
pub type GatherJob<P> = Box<dyn FnOnce() -> Result<P, AssetError> + Send + 'static>;

// =============================================================================
// ASSET TRAIT
// =============================================================================

/// The custom operations a concrete resource kind supplies.
///
/// Implementors never touch status fields; [`Resource`] sequences these calls
/// and records failures.
pub trait Asset {
    /// Intermediate data produced by gathering and consumed by processing,
    /// e.g. file bytes or decoded pixels.
    type Payload: Send + 'static;

    /// Human-readable name used in progress output and logs.
    fn label(&self) -> &str;

    /// Whether this asset has a fetch step at all.
    ///
    /// Read once when the asset is wrapped in a [`Resource`].
    fn has_gather(&self) -> bool {
        true
    }

    /// Build the fetch job. Only called when `has_gather` is true.
    ///
    /// The job must own everything it needs, it may run on another thread.
    fn gather_job(&self) -> GatherJob<Self::Payload>;

    /// Finalize the asset on the driver context.
    ///
    /// `payload` is `None` for assets without a gather step.
    fn process(&mut self, payload: Option<&Self::Payload>) -> Result<(), AssetError>;

    /// Release a gathered payload. Dropping it is the default.
    fn discard(&mut self, payload: Self::Payload) {
        drop(payload);
    }

    /// Release whatever `process` produced.
    fn unload(&mut self);
}

// =============================================================================
// LOADABLE TRAIT
// =============================================================================

/// The capability contract a resource exposes to stages and bundles.
///
/// Status only moves forward through `gather`/`quick_gather`/`process` and
/// backward through their inverses `discard`/`unload`.
pub trait Loadable {
    /// Human-readable name of the resource.
    fn label(&self) -> &str;

    /// Whether the resource has a fetch step. Fixed at construction.
    fn has_gather(&self) -> bool;

    /// Current gather status.
    ///
    /// A finished but not yet joined worker reports `Gathered`.
    fn gather_status(&self) -> GatherStatus;

    /// Current process status.
    fn process_status(&self) -> ProcessStatus;

    /// The most recent failure, if the last gather or process step failed.
    fn error(&self) -> Option<&AssetError>;

    /// Start fetching on a background worker.
    fn gather(&mut self);

    /// Fetch on the calling thread.
    fn quick_gather(&mut self);

    /// Wait for an outstanding background fetch, if any.
    fn join(&mut self);

    /// Release the gathered data.
    fn discard(&mut self);

    /// Finalize on the calling thread.
    fn process(&mut self);

    /// Release the finalized state.
    fn unload(&mut self);
}

// =============================================================================
// GATHER CONFIGURATION
// =============================================================================

/// Worker thread settings for a resource's background gathers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatherConfig {
    /// Worker thread name prefix.
    pub thread_prefix: String,
    /// Worker stack size in bytes. `None` uses the platform default.
    pub stack_size: Option<usize>,
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            thread_prefix: DEFAULT_THREAD_PREFIX.to_string(),
            stack_size: None,
        }
    }
}

impl GatherConfig {
    fn thread_name(&self, label: &str) -> String {
        let label: String = label.chars().take(MAX_THREAD_LABEL).collect();
        format!("{}-{}", self.thread_prefix, label)
    }
}

// =============================================================================
// RESOURCE
// =============================================================================

enum GatherState<P> {
    Ungathered,
    Gathering(JoinHandle<Result<P, AssetError>>),
    /// `None` when the fetch failed.
    Gathered(Option<P>),
}

/// An [`Asset`] wrapped with its loading state.
///
/// Resources are owned by the application; bundles only borrow them.
pub struct Resource<A: Asset> {
    asset: A,
    config: GatherConfig,
    has_gather: bool,
    gather: GatherState<A::Payload>,
    process: ProcessStatus,
    error: Option<AssetError>,
}

impl<A: Asset> Resource<A> {
    /// Wrap an asset with default gather settings.
    #[must_use]
    pub fn new(asset: A) -> Self {
        Self::with_config(asset, GatherConfig::default())
    }

    /// Wrap an asset with explicit gather settings.
    #[must_use]
    pub fn with_config(asset: A, config: GatherConfig) -> Self {
        let has_gather = asset.has_gather();
        Self {
            asset,
            config,
            has_gather,
            gather: GatherState::Ungathered,
            process: ProcessStatus::Unprocessed,
            error: None,
        }
    }

    /// Get the wrapped asset.
    #[must_use]
    pub fn asset(&self) -> &A {
        &self.asset
    }

    /// Get the wrapped asset mutably.
    pub fn asset_mut(&mut self) -> &mut A {
        &mut self.asset
    }

    /// Get the gathered payload, once it has been joined.
    #[must_use]
    pub fn payload(&self) -> Option<&A::Payload> {
        match &self.gather {
            GatherState::Gathered(payload) => payload.as_ref(),
            _ => None,
        }
    }

    /// Get the gather settings.
    #[must_use]
    pub fn config(&self) -> &GatherConfig {
        &self.config
    }

    fn settle(&mut self, outcome: Result<A::Payload, AssetError>) {
        match outcome {
            Ok(payload) => {
                tracing::debug!("Gathered: {}", self.asset.label());
                self.gather = GatherState::Gathered(Some(payload));
            }
            Err(e) => {
                tracing::warn!("Gather failed for {}: {}", self.asset.label(), e);
                self.error = Some(e);
                self.gather = GatherState::Gathered(None);
            }
        }
    }
}

/// Extract a readable message from a worker panic.
fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl<A: Asset> Loadable for Resource<A> {
    fn label(&self) -> &str {
        self.asset.label()
    }

    fn has_gather(&self) -> bool {
        self.has_gather
    }

    fn gather_status(&self) -> GatherStatus {
        match &self.gather {
            GatherState::Ungathered => GatherStatus::Ungathered,
            GatherState::Gathering(handle) if handle.is_finished() => GatherStatus::Gathered,
            GatherState::Gathering(_) => GatherStatus::Gathering,
            GatherState::Gathered(_) => GatherStatus::Gathered,
        }
    }

    fn process_status(&self) -> ProcessStatus {
        self.process
    }

    fn error(&self) -> Option<&AssetError> {
        self.error.as_ref()
    }

    fn gather(&mut self) {
        if !self.has_gather || !matches!(self.gather, GatherState::Ungathered) {
            return;
        }

        self.error = None;
        let job = self.asset.gather_job();
        let mut builder = thread::Builder::new().name(self.config.thread_name(self.asset.label()));
        if let Some(size) = self.config.stack_size {
            builder = builder.stack_size(size);
        }

        match builder.spawn(job) {
            Ok(handle) => {
                tracing::debug!("Gather started: {}", self.asset.label());
                self.gather = GatherState::Gathering(handle);
            }
            Err(e) => self.settle(Err(AssetError::Spawn(e.to_string()))),
        }
    }

    fn quick_gather(&mut self) {
        if !self.has_gather {
            return;
        }
        match self.gather {
            GatherState::Ungathered => {
                self.error = None;
                let job = self.asset.gather_job();
                let outcome = panic::catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|p| {
                    Err(AssetError::GatherPanicked(panic_message(p.as_ref())))
                });
                self.settle(outcome);
            }
            GatherState::Gathering(_) => self.join(),
            GatherState::Gathered(_) => {}
        }
    }

    fn join(&mut self) {
        if !matches!(self.gather, GatherState::Gathering(_)) {
            return;
        }
        let GatherState::Gathering(handle) =
            std::mem::replace(&mut self.gather, GatherState::Ungathered)
        else {
            return;
        };

        let outcome = handle
            .join()
            .unwrap_or_else(|p| Err(AssetError::GatherPanicked(panic_message(p.as_ref()))));
        self.settle(outcome);
    }

    fn discard(&mut self) {
        self.join();
        if let GatherState::Gathered(Some(payload)) =
            std::mem::replace(&mut self.gather, GatherState::Ungathered)
        {
            tracing::debug!("Discarded: {}", self.asset.label());
            self.asset.discard(payload);
        }
    }

    fn process(&mut self) {
        if self.process == ProcessStatus::Processed {
            return;
        }

        if self.has_gather {
            self.join();
            if matches!(self.gather, GatherState::Ungathered) {
                tracing::debug!("Processing ungathered {}, gathering inline", self.label());
                self.quick_gather();
            }
        } else {
            self.error = None;
        }

        let payload = match &self.gather {
            GatherState::Gathered(payload) => payload.as_ref(),
            _ => None,
        };

        // A failed gather leaves nothing to process; the error stays recorded.
        if self.has_gather && payload.is_none() {
            self.process = ProcessStatus::Processed;
            return;
        }

        if let Err(e) = self.asset.process(payload) {
            tracing::warn!("Process failed for {}: {}", self.asset.label(), e);
            self.error = Some(e);
        } else {
            tracing::debug!("Processed: {}", self.asset.label());
        }
        self.process = ProcessStatus::Processed;
    }

    fn unload(&mut self) {
        if self.process == ProcessStatus::Unprocessed {
            return;
        }
        self.asset.unload();
        self.process = ProcessStatus::Unprocessed;
        self.error = None;
        // A failed fetch holds nothing; the next load must fetch again.
        if matches!(self.gather, GatherState::Gathered(None)) {
            self.gather = GatherState::Ungathered;
        }
        tracing::debug!("Unloaded: {}", self.asset.label());
    }
}

impl<A: Asset> Drop for Resource<A> {
    fn drop(&mut self) {
        if let GatherState::Gathering(handle) =
            std::mem::replace(&mut self.gather, GatherState::Ungathered)
        {
            tracing::debug!("Joining outstanding gather on drop: {}", self.asset.label());
            let _ = handle.join();
        }
    }
}

impl<A: Asset> std::fmt::Debug for Resource<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("label", &self.asset.label())
            .field("has_gather", &self.has_gather)
            .field("gather", &self.gather_status())
            .field("process", &self.process)
            .field("error", &self.error)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
