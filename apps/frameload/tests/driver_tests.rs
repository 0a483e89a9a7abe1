//! Frame driver tests: manifests loaded and unloaded end to end.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use frameload::AppError;
use frameload::assets::{Device, borrow_all, build_resources};
use frameload::driver::{DriverOptions, run_session};
use frameload::manifest::{Manifest, Mode};
use frameload_core::{AssetError, Bundle, Direction, LoadError, Loadable, ProcessStatus};
use std::future::pending;
use std::path::Path;
use std::time::Duration;

fn fast(manifest: &Manifest) -> DriverOptions {
    DriverOptions {
        fps: 1000,
        ..DriverOptions::from_config(&manifest.loader)
    }
}

// =============================================================================
// INCREMENTAL SESSIONS
// =============================================================================

#[tokio::test]
async fn test_incremental_load_then_unload() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("grass.bmp"), vec![7u8; 512]).unwrap();

    let text = r#"
        [[asset]]
        name = "grass"
        kind = "file"
        path = "grass.bmp"

        [[asset]]
        name = "shader"
        kind = "inline"
        text = "void main() {}"

        [[asset]]
        name = "terrain"
        kind = "synthetic"
        bytes = 1024
        delay_ms = 5
    "#;
    let manifest = Manifest::parse(text, dir.path()).unwrap();
    let device = Device::new(None);
    let mut resources = build_resources(&manifest, &device);
    let opts = fast(&manifest);
    let mut bundle = Bundle::new(borrow_all(&mut resources));

    let mut frames_seen = 0u64;
    let load = run_session(&mut bundle, Direction::Load, &opts, pending(), |_| {
        frames_seen += 1;
    })
    .await
    .unwrap();

    assert!(!load.interrupted);
    assert!(load.failures.is_empty());
    assert_eq!(load.completed, 3);
    assert_eq!(load.total, 3);
    assert_eq!(load.frames, frames_seen);
    assert!(load.ticks >= load.frames);
    assert!(bundle.is_done());
    assert_eq!(device.live_count(), 3);
    assert_eq!(device.live_bytes(), 512 + 14 + 1024);
    assert_eq!(device.get("grass").unwrap().digest, blake3::hash(&[7u8; 512]).to_hex().to_string());

    let unload = run_session(&mut bundle, Direction::Unload, &opts, pending(), |_| {})
        .await
        .unwrap();
    assert_eq!(unload.completed, 3);
    assert_eq!(device.live_count(), 0);
    assert!(bundle.iter().all(|r| r.process_status() == ProcessStatus::Unprocessed));
}

#[tokio::test]
async fn test_progress_reaches_done() {
    let manifest = Manifest::parse(
        "[[asset]]\nname = \"a\"\nkind = \"inline\"\ntext = \"x\"\n",
        Path::new("."),
    )
    .unwrap();
    let device = Device::new(None);
    let mut resources = build_resources(&manifest, &device);
    let mut bundle = Bundle::new(borrow_all(&mut resources));

    let mut lines = Vec::new();
    run_session(&mut bundle, Direction::Load, &fast(&manifest), pending(), |p| {
        lines.push(p.to_string());
    })
    .await
    .unwrap();

    assert_eq!(lines.last().map(String::as_str), Some("[1/1] done"));
}

// =============================================================================
// QUICK SESSIONS
// =============================================================================

#[tokio::test]
async fn test_quick_mode_is_one_frame() {
    let text = r#"
        [loader]
        mode = "quick"

        [[asset]]
        name = "a"
        kind = "synthetic"
        bytes = 64

        [[asset]]
        name = "b"
        kind = "synthetic"
        bytes = 64
    "#;
    let manifest = Manifest::parse(text, Path::new(".")).unwrap();
    let device = Device::new(None);
    let mut resources = build_resources(&manifest, &device);
    let opts = DriverOptions::from_config(&manifest.loader);
    assert_eq!(opts.mode, Mode::Quick);
    let mut bundle = Bundle::new(borrow_all(&mut resources));

    let load = run_session(&mut bundle, Direction::Load, &opts, pending(), |_| {})
        .await
        .unwrap();
    assert_eq!(load.frames, 1);
    assert_eq!(load.completed, 2);
    assert_eq!(device.live_count(), 2);
}

// =============================================================================
// FAILURES
// =============================================================================

#[tokio::test]
async fn test_failures_are_reported_per_asset() {
    let dir = tempfile::tempdir().unwrap();
    let text = r#"
        [[asset]]
        name = "missing"
        kind = "file"
        path = "nope.bin"

        [[asset]]
        name = "broken"
        kind = "synthetic"
        bytes = 8
        fail = true

        [[asset]]
        name = "fine"
        kind = "inline"
        text = "ok"
    "#;
    let manifest = Manifest::parse(text, dir.path()).unwrap();
    let device = Device::new(None);
    let mut resources = build_resources(&manifest, &device);
    let mut bundle = Bundle::new(borrow_all(&mut resources));

    let load = run_session(&mut bundle, Direction::Load, &fast(&manifest), pending(), |_| {})
        .await
        .unwrap();

    let labels: Vec<&str> = load.failures.iter().map(|f| f.label.as_str()).collect();
    assert_eq!(labels, vec!["missing", "broken"]);
    assert!(matches!(load.failures[0].error, AssetError::Missing(_)));
    assert_eq!(load.completed, 3);
    assert_eq!(device.live_count(), 1);
}

#[tokio::test]
async fn test_device_capacity_failure() {
    let text = r#"
        [device]
        capacity_bytes = 100

        [[asset]]
        name = "small"
        kind = "synthetic"
        bytes = 60

        [[asset]]
        name = "large"
        kind = "synthetic"
        bytes = 60
    "#;
    let manifest = Manifest::parse(text, Path::new(".")).unwrap();
    let device = Device::new(manifest.device.capacity_bytes);
    let mut resources = build_resources(&manifest, &device);
    let mut bundle = Bundle::new(borrow_all(&mut resources));

    let load = run_session(&mut bundle, Direction::Load, &fast(&manifest), pending(), |_| {})
        .await
        .unwrap();
    assert_eq!(load.failures.len(), 1);
    assert_eq!(load.failures[0].label, "large");
    assert!(matches!(load.failures[0].error, AssetError::Upload(_)));
}

// =============================================================================
// SHUTDOWN
// =============================================================================

#[tokio::test]
async fn test_shutdown_interrupts_session() {
    let text = r#"
        [[asset]]
        name = "slow"
        kind = "synthetic"
        bytes = 16
        delay_ms = 300
    "#;
    let manifest = Manifest::parse(text, Path::new(".")).unwrap();
    let device = Device::new(None);
    let mut resources = build_resources(&manifest, &device);
    let opts = fast(&manifest);
    let mut bundle = Bundle::new(borrow_all(&mut resources));

    let shutdown = tokio::time::sleep(Duration::from_millis(30));
    let load = run_session(&mut bundle, Direction::Load, &opts, shutdown, |_| {})
        .await
        .unwrap();

    assert!(load.interrupted);
    assert_eq!(load.completed, 0);
    assert!(load.stalls > 0);
    assert!(!bundle.is_done());

    // The interrupted session is still open.
    let again = run_session(&mut bundle, Direction::Unload, &opts, pending(), |_| {}).await;
    assert!(matches!(
        again,
        Err(AppError::Load(LoadError::SessionActive(Direction::Load)))
    ));
}
