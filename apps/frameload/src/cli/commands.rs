//! # CLI Command Implementations

use frameload::AppError;
use frameload::assets::{Device, borrow_all, build_resources};
use frameload::driver::{self, DriverOptions, SessionReport};
use frameload::manifest::{AssetSpec, Manifest, Mode, SAMPLE_MANIFEST};
use frameload_core::{Bundle, Direction, Progress};
use std::path::Path;

// =============================================================================
// RUN COMMAND
// =============================================================================

/// Command-line adjustments applied on top of the manifest.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub quick: bool,
    pub no_clean: bool,
    pub fps: Option<u32>,
    pub keep_loaded: bool,
    pub quiet: bool,
}

impl RunOverrides {
    fn apply(&self, manifest: &mut Manifest) -> Result<(), AppError> {
        if self.quick {
            manifest.loader.mode = Mode::Quick;
        }
        if self.no_clean {
            manifest.loader.clean = false;
        }
        if let Some(fps) = self.fps {
            manifest.loader.fps = fps;
        }
        if self.keep_loaded {
            manifest.loader.unload = false;
        }
        manifest.validate()
    }
}

/// Load every asset in a manifest, then unload unless told otherwise.
pub async fn cmd_run(
    manifest_path: &Path,
    overrides: &RunOverrides,
    json_mode: bool,
) -> Result<(), AppError> {
    let mut manifest = Manifest::load(manifest_path)?;
    overrides.apply(&mut manifest)?;

    let device = Device::new(manifest.device.capacity_bytes);
    let mut resources = build_resources(&manifest, &device);
    let opts = DriverOptions::from_config(&manifest.loader);
    let mut bundle = Bundle::new(borrow_all(&mut resources));

    let show_progress = !json_mode && !overrides.quiet;
    let mut last_line = String::new();
    let mut on_frame = |progress: &Progress| {
        if !show_progress {
            return;
        }
        let line = progress.to_string();
        if line != last_line {
            println!("{}", line);
            last_line = line;
        }
    };

    let load = driver::run_session(
        &mut bundle,
        Direction::Load,
        &opts,
        driver::ctrl_c(),
        &mut on_frame,
    )
    .await?;
    let loaded = (device.live_count(), device.live_bytes());

    let unload = if manifest.loader.unload && !load.interrupted {
        Some(
            driver::run_session(
                &mut bundle,
                Direction::Unload,
                &opts,
                driver::ctrl_c(),
                &mut on_frame,
            )
            .await?,
        )
    } else {
        None
    };

    if json_mode {
        let output = serde_json::json!({
            "load": load,
            "device": { "uploads": loaded.0, "bytes": loaded.1 },
            "unload": unload,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_report(&load);
    println!("Device: {} uploads, {} bytes", loaded.0, loaded.1);
    if let Some(report) = &unload {
        print_report(report);
        println!(
            "Device: {} uploads, {} bytes",
            device.live_count(),
            device.live_bytes()
        );
    }
    Ok(())
}

fn print_report(report: &SessionReport) {
    let verb = match report.direction {
        Direction::Load => "Loaded",
        Direction::Unload => "Unloaded",
    };
    println!(
        "{} {}/{} resources in {} frames, {} ticks ({} ms){}",
        verb,
        report.completed,
        report.total,
        report.frames,
        report.ticks,
        report.elapsed_ms,
        if report.interrupted { ", interrupted" } else { "" }
    );
    for failure in &report.failures {
        println!("  FAILED {}: {}", failure.label, failure.error);
    }
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Validate a manifest and report missing source files.
pub fn cmd_check(manifest_path: &Path, json_mode: bool) -> Result<(), AppError> {
    let manifest = Manifest::load(manifest_path)?;

    let missing: Vec<&str> = manifest
        .assets
        .iter()
        .filter_map(|asset| match asset {
            AssetSpec::File { name, path } if !path.is_file() => Some(name.as_str()),
            _ => None,
        })
        .collect();

    if json_mode {
        let output = serde_json::json!({
            "manifest": manifest_path.display().to_string(),
            "loader": manifest.loader,
            "assets": manifest.assets,
            "missing": missing,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Manifest: {}", manifest_path.display());
        println!(
            "  Mode: {:?}, clean: {}, fps: {}",
            manifest.loader.mode, manifest.loader.clean, manifest.loader.fps
        );
        for asset in &manifest.assets {
            let flag = if missing.contains(&asset.name()) {
                " (missing)"
            } else {
                ""
            };
            println!("  {:<10} {}{}", asset.kind(), asset.name(), flag);
        }
    }

    if !missing.is_empty() {
        return Err(AppError::Manifest(format!(
            "{} file asset(s) missing: {}",
            missing.len(),
            missing.join(", ")
        )));
    }
    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Write the starter manifest.
pub fn cmd_init(output: &Path, force: bool) -> Result<(), AppError> {
    if output.exists() && !force {
        return Err(AppError::Io(format!(
            "{} already exists. Use --force to overwrite.",
            output.display()
        )));
    }

    std::fs::write(output, SAMPLE_MANIFEST)
        .map_err(|e| AppError::Io(format!("Cannot write '{}': {}", output.display(), e)))?;
    println!("Wrote starter manifest to {}", output.display());
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
