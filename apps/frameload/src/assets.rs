//! # Asset Kinds
//!
//! Concrete [`Asset`] implementations driven by the CLI, and the simulated
//! device they upload into.
//!
//! | Kind        | Gather step              | Payload   |
//! |-------------|--------------------------|-----------|
//! | `file`      | read bytes from disk     | `Vec<u8>` |
//! | `inline`    | none                     | `()`      |
//! | `synthetic` | sleep, generate bytes    | `Vec<u8>` |
//!
//! Processing uploads the bytes to the [`Device`], which records a BLAKE3
//! digest per asset. Unloading releases the upload.

use crate::manifest::{AssetSpec, Manifest};
use frameload_core::{Asset, AssetError, GatherConfig, GatherJob, Loadable, Resource};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

// =============================================================================
// DEVICE
// =============================================================================

/// One finalized asset held by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Upload {
    /// Size in bytes.
    pub bytes: u64,
    /// BLAKE3 hex digest of the uploaded content.
    pub digest: String,
}

/// Simulated upload target, standing in for GPU memory or an audio mixer.
///
/// Cheap to clone; clones share the same uploads. Lives on the driver
/// thread only, like the graphics context it imitates.
#[derive(Debug, Clone, Default)]
pub struct Device {
    uploads: Rc<RefCell<BTreeMap<String, Upload>>>,
    capacity: Option<u64>,
}

impl Device {
    /// Create a device with an optional capacity in bytes.
    #[must_use]
    pub fn new(capacity: Option<u64>) -> Self {
        Self {
            uploads: Rc::default(),
            capacity,
        }
    }

    /// Upload content under a name, replacing any previous upload.
    pub fn upload(&self, name: &str, content: &[u8]) -> Result<Upload, AssetError> {
        let mut uploads = self.uploads.borrow_mut();
        let size = content.len() as u64;

        if let Some(capacity) = self.capacity {
            let others: u64 = uploads
                .iter()
                .filter(|(key, _)| key.as_str() != name)
                .map(|(_, u)| u.bytes)
                .sum();
            if others + size > capacity {
                return Err(AssetError::Upload(format!(
                    "'{}' needs {} bytes, {} of {} in use",
                    name, size, others, capacity
                )));
            }
        }

        let upload = Upload {
            bytes: size,
            digest: blake3::hash(content).to_hex().to_string(),
        };
        uploads.insert(name.to_string(), upload.clone());
        Ok(upload)
    }

    /// Release an upload. Returns whether one existed.
    pub fn release(&self, name: &str) -> bool {
        self.uploads.borrow_mut().remove(name).is_some()
    }

    /// Get an upload by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Upload> {
        self.uploads.borrow().get(name).cloned()
    }

    /// Number of live uploads.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.uploads.borrow().len()
    }

    /// Total bytes held by live uploads.
    #[must_use]
    pub fn live_bytes(&self) -> u64 {
        self.uploads.borrow().values().map(|u| u.bytes).sum()
    }
}

// =============================================================================
// FILE ASSET
// =============================================================================

/// Bytes read from disk on a gather worker.
#[derive(Debug)]
pub struct FileAsset {
    name: String,
    path: PathBuf,
    device: Device,
}

impl FileAsset {
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, device: &Device) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            device: device.clone(),
        }
    }
}

impl Asset for FileAsset {
    type Payload = Vec<u8>;

    fn label(&self) -> &str {
        &self.name
    }

    fn gather_job(&self) -> GatherJob<Vec<u8>> {
        let path = self.path.clone();
        Box::new(move || {
            let bytes = std::fs::read(&path).map_err(|e| {
                AssetError::from(std::io::Error::new(
                    e.kind(),
                    format!("{}: {}", path.display(), e),
                ))
            })?;
            if bytes.is_empty() {
                return Err(AssetError::Invalid(format!("{} is empty", path.display())));
            }
            Ok(bytes)
        })
    }

    fn process(&mut self, payload: Option<&Vec<u8>>) -> Result<(), AssetError> {
        let bytes = payload.ok_or_else(|| AssetError::Invalid("no data gathered".to_string()))?;
        self.device.upload(&self.name, bytes)?;
        Ok(())
    }

    fn unload(&mut self) {
        self.device.release(&self.name);
    }
}

// =============================================================================
// INLINE ASSET
// =============================================================================

/// Text embedded in the manifest. Nothing to fetch.
#[derive(Debug)]
pub struct InlineAsset {
    name: String,
    text: String,
    device: Device,
}

impl InlineAsset {
    #[must_use]
    pub fn new(name: impl Into<String>, text: impl Into<String>, device: &Device) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            device: device.clone(),
        }
    }
}

impl Asset for InlineAsset {
    type Payload = ();

    fn label(&self) -> &str {
        &self.name
    }

    fn has_gather(&self) -> bool {
        false
    }

    fn gather_job(&self) -> GatherJob<()> {
        Box::new(|| Ok(()))
    }

    fn process(&mut self, _payload: Option<&()>) -> Result<(), AssetError> {
        self.device.upload(&self.name, self.text.as_bytes())?;
        Ok(())
    }

    fn unload(&mut self) {
        self.device.release(&self.name);
    }
}

// =============================================================================
// SYNTHETIC ASSET
// =============================================================================

/// Generated bytes produced after an artificial delay.
///
/// Stands in for slow decodes when exercising the frame driver.
#[derive(Debug)]
pub struct SyntheticAsset {
    name: String,
    bytes: usize,
    delay: Duration,
    fail: bool,
    device: Device,
}

impl SyntheticAsset {
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: usize, delay: Duration, device: &Device) -> Self {
        Self {
            name: name.into(),
            bytes,
            delay,
            fail: false,
            device: device.clone(),
        }
    }

    /// Make the gather step fail after its delay.
    #[must_use]
    pub fn failing(mut self, fail: bool) -> Self {
        self.fail = fail;
        self
    }
}

/// Deterministic filler: byte `i` is `i mod 251`.
fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

impl Asset for SyntheticAsset {
    type Payload = Vec<u8>;

    fn label(&self) -> &str {
        &self.name
    }

    fn gather_job(&self) -> GatherJob<Vec<u8>> {
        let (len, delay, fail, name) = (self.bytes, self.delay, self.fail, self.name.clone());
        Box::new(move || {
            std::thread::sleep(delay);
            if fail {
                return Err(AssetError::Io(format!("synthetic failure for '{}'", name)));
            }
            Ok(pattern(len))
        })
    }

    fn process(&mut self, payload: Option<&Vec<u8>>) -> Result<(), AssetError> {
        let bytes = payload.ok_or_else(|| AssetError::Invalid("no data gathered".to_string()))?;
        self.device.upload(&self.name, bytes)?;
        Ok(())
    }

    fn unload(&mut self) {
        self.device.release(&self.name);
    }
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

/// Build one resource per manifest entry, in manifest order.
#[must_use]
pub fn build_resources(manifest: &Manifest, device: &Device) -> Vec<Box<dyn Loadable>> {
    manifest
        .assets
        .iter()
        .map(|spec| build_resource(spec, &manifest.gather, device))
        .collect()
}

fn build_resource(spec: &AssetSpec, config: &GatherConfig, device: &Device) -> Box<dyn Loadable> {
    let config = config.clone();
    match spec {
        AssetSpec::File { name, path } => {
            Box::new(Resource::with_config(FileAsset::new(name, path, device), config))
        }
        AssetSpec::Inline { name, text } => {
            Box::new(Resource::with_config(InlineAsset::new(name, text, device), config))
        }
        AssetSpec::Synthetic {
            name,
            bytes,
            delay_ms,
            fail,
        } => {
            let asset = SyntheticAsset::new(name, *bytes, Duration::from_millis(*delay_ms), device)
                .failing(*fail);
            Box::new(Resource::with_config(asset, config))
        }
    }
}

/// Borrow owned resources for a bundle.
pub fn borrow_all(resources: &mut [Box<dyn Loadable>]) -> Vec<&mut dyn Loadable> {
    resources
        .iter_mut()
        .map(|r| &mut **r as &mut dyn Loadable)
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
