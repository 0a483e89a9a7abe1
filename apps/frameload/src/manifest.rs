//! # Asset Manifest
//!
//! TOML description of what to load and how to drive it.
//!
//! ```toml
//! [loader]
//! mode = "incremental"
//! clean = true
//! fps = 60
//!
//! [device]
//! capacity_bytes = 1048576
//!
//! [[asset]]
//! name = "grass"
//! kind = "file"
//! path = "textures/grass.bmp"
//!
//! [[asset]]
//! name = "flat"
//! kind = "inline"
//! text = "void main() {}"
//! ```
//!
//! Relative file paths resolve against the manifest's directory.

use crate::AppError;
use frameload_core::GatherConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum manifest size (1 MB).
const MAX_MANIFEST_SIZE: u64 = 1024 * 1024;

/// Highest accepted frame rate.
pub const MAX_FPS: u32 = 1000;

/// Largest synthetic asset (64 MB).
pub const MAX_SYNTHETIC_BYTES: usize = 64 * 1024 * 1024;

// =============================================================================
// CONFIG SECTIONS
// =============================================================================

/// How a session is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One bounded unit of work per tick, ticks paced by the frame clock.
    #[default]
    Incremental,
    /// One blocking sweep.
    Quick,
}

/// The `[loader]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    pub mode: Mode,
    /// Discard gathered data after loading and after unloading.
    pub clean: bool,
    /// Frame rate of the incremental driver.
    pub fps: u32,
    /// Bundle updates attempted per frame.
    pub ticks_per_frame: u32,
    /// Run an unload session after loading.
    pub unload: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Incremental,
            clean: true,
            fps: 60,
            ticks_per_frame: 1,
            unload: true,
        }
    }
}

/// The `[device]` section, settings of the simulated upload target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    /// Upload capacity in bytes. Unlimited when absent.
    pub capacity_bytes: Option<u64>,
}

/// One `[[asset]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AssetSpec {
    /// Bytes read from disk on a gather worker.
    File { name: String, path: PathBuf },
    /// Text embedded in the manifest; nothing to gather.
    Inline { name: String, text: String },
    /// Generated bytes after an artificial delay.
    Synthetic {
        name: String,
        bytes: usize,
        #[serde(default)]
        delay_ms: u64,
        #[serde(default)]
        fail: bool,
    },
}

impl AssetSpec {
    /// Get the asset name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            AssetSpec::File { name, .. }
            | AssetSpec::Inline { name, .. }
            | AssetSpec::Synthetic { name, .. } => name,
        }
    }

    /// Get the kind tag.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            AssetSpec::File { .. } => "file",
            AssetSpec::Inline { .. } => "inline",
            AssetSpec::Synthetic { .. } => "synthetic",
        }
    }
}

// =============================================================================
// MANIFEST
// =============================================================================

/// A parsed and validated manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub gather: GatherConfig,
    #[serde(default, rename = "asset")]
    pub assets: Vec<AssetSpec>,
}

impl Manifest {
    /// Read, parse and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            AppError::Io(format!("Cannot read manifest '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_MANIFEST_SIZE {
            return Err(AppError::Manifest(format!(
                "Manifest size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_MANIFEST_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::Io(format!("Cannot read manifest '{}': {}", path.display(), e))
        })?;
        let base = path.parent().unwrap_or(Path::new("."));
        Self::parse(&text, base)
    }

    /// Parse and validate manifest text, resolving file paths against `base`.
    pub fn parse(text: &str, base: &Path) -> Result<Self, AppError> {
        let mut manifest: Manifest =
            toml::from_str(text).map_err(|e| AppError::Manifest(e.to_string()))?;

        for asset in &mut manifest.assets {
            if let AssetSpec::File { path, .. } = asset
                && path.is_relative()
            {
                *path = base.join(&*path);
            }
        }

        manifest.validate()?;
        Ok(manifest)
    }

    /// Check structural rules serde cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.assets.is_empty() {
            return Err(AppError::Manifest("Manifest lists no assets".to_string()));
        }
        if self.loader.fps == 0 || self.loader.fps > MAX_FPS {
            return Err(AppError::Manifest(format!(
                "fps must be between 1 and {}, got {}",
                MAX_FPS, self.loader.fps
            )));
        }
        if self.loader.ticks_per_frame == 0 {
            return Err(AppError::Manifest(
                "ticks_per_frame must be at least 1".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        for asset in &self.assets {
            let name = asset.name();
            if name.trim().is_empty() {
                return Err(AppError::Manifest("Asset name cannot be empty".to_string()));
            }
            if !seen.insert(name) {
                return Err(AppError::Manifest(format!("Duplicate asset name '{}'", name)));
            }
            if let AssetSpec::Synthetic { bytes, .. } = asset
                && *bytes > MAX_SYNTHETIC_BYTES
            {
                return Err(AppError::Manifest(format!(
                    "Synthetic asset '{}' exceeds {} bytes",
                    name, MAX_SYNTHETIC_BYTES
                )));
            }
        }
        Ok(())
    }
}

/// Starter manifest written by `frameload init`.
pub const SAMPLE_MANIFEST: &str = r#"# frameload asset manifest

[loader]
mode = "incremental"   # or "quick"
clean = true           # discard gathered data once processed
fps = 60
ticks_per_frame = 1
unload = true          # unload everything after loading

[device]
# capacity_bytes = 1048576

[[asset]]
name = "flat-shader"
kind = "inline"
text = "void main() { gl_FragColor = vec4(1.0); }"

[[asset]]
name = "terrain"
kind = "synthetic"
bytes = 65536
delay_ms = 40

[[asset]]
name = "skybox"
kind = "synthetic"
bytes = 262144
delay_ms = 120
"#;

// =============================================================================
// TESTS
// =============================================================================
