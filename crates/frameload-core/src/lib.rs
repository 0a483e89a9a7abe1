//! # frameload-core
//!
//! The staged loading engine for frameload - THE ENGINE.
//!
//! A [`Bundle`] borrows an ordered list of resources and moves them through a
//! chain of stages: background gathering, foreground processing, optional
//! cleanup of gathered data, and unloading. The driver either blocks until a
//! session completes or advances it one bounded unit of work per frame.
//!
//! ## Example
//!
//! ```
//! use frameload_core::{Asset, AssetError, Bundle, GatherJob, Loadable, Resource};
//!
//! struct Texture {
//!     name: String,
//!     uploaded: Option<usize>,
//! }
//!
//! impl Asset for Texture {
//!     type Payload = Vec<u8>;
//!
//!     fn label(&self) -> &str {
//!         &self.name
//!     }
//!
//!     fn gather_job(&self) -> GatherJob<Vec<u8>> {
//!         Box::new(|| Ok(vec![0u8; 64]))
//!     }
//!
//!     fn process(&mut self, pixels: Option<&Vec<u8>>) -> Result<(), AssetError> {
//!         self.uploaded = pixels.map(Vec::len);
//!         Ok(())
//!     }
//!
//!     fn unload(&mut self) {
//!         self.uploaded = None;
//!     }
//! }
//!
//! let mut grass = Resource::new(Texture { name: "grass".into(), uploaded: None });
//! let mut bundle = Bundle::new([&mut grass as &mut dyn Loadable]);
//!
//! bundle.load(true).unwrap();
//! while !bundle.is_done() {
//!     bundle.update().unwrap();
//! }
//! drop(bundle);
//! assert_eq!(grass.asset().uploaded, Some(64));
//! ```
//!
//! ## Architectural Constraints
//!
//! - Single driver: bundles and stages are advanced from one context
//! - The only concurrency is one background worker per gathering resource
//! - Bundles borrow resources and never own them
//! - No async runtime, no network dependencies

// =============================================================================
// MODULES
// =============================================================================

pub mod bundle;
pub mod primitives;
pub mod resource;
pub mod stage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{AssetError, Direction, GatherStatus, LoadError, LoadFailure, ProcessStatus};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use bundle::{Bundle, Progress, Step};
pub use resource::{Asset, GatherConfig, GatherJob, Loadable, Resource};
pub use stage::{Stage, StageKind, Tick, TickAction};
