//! Manifest loading tests against real files.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use frameload::AppError;
use frameload::assets::{Device, build_resources};
use frameload::manifest::{AssetSpec, Manifest, Mode, SAMPLE_MANIFEST};
use frameload_core::{GatherStatus, Loadable};

// =============================================================================
// LOADING
// =============================================================================

#[test]
fn test_load_resolves_paths_against_manifest_dir() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("levels");
    std::fs::create_dir(&nested).unwrap();
    let path = nested.join("forest.toml");
    std::fs::write(
        &path,
        "[[asset]]\nname = \"bark\"\nkind = \"file\"\npath = \"bark.png\"\n",
    )
    .unwrap();

    let manifest = Manifest::load(&path).unwrap();
    match &manifest.assets[0] {
        AssetSpec::File { path, .. } => assert_eq!(path, &nested.join("bark.png")),
        other => panic!("unexpected asset {:?}", other),
    }
}

#[test]
fn test_load_missing_manifest_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Manifest::load(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(AppError::Io(_))));
}

#[test]
fn test_load_rejects_oversized_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.toml");
    std::fs::write(&path, "#".repeat(2 * 1024 * 1024)).unwrap();

    let err = Manifest::load(&path).unwrap_err();
    assert!(err.to_string().contains("exceeds maximum"));
}

#[test]
fn test_unknown_loader_key_rejected() {
    let text = "[loader]\nspeed = 3\n\n[[asset]]\nname = \"a\"\nkind = \"inline\"\ntext = \"x\"\n";
    let result = Manifest::parse(text, std::path::Path::new("."));
    assert!(matches!(result, Err(AppError::Manifest(_))));
}

#[test]
fn test_oversized_synthetic_rejected() {
    let text = "[[asset]]\nname = \"a\"\nkind = \"synthetic\"\nbytes = 999999999999\n";
    let result = Manifest::parse(text, std::path::Path::new("."));
    assert!(matches!(result, Err(AppError::Manifest(_))));
}

// =============================================================================
// RESOURCE CONSTRUCTION
// =============================================================================

#[test]
fn test_sample_manifest_builds_idle_resources() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frameload.toml");
    std::fs::write(&path, SAMPLE_MANIFEST).unwrap();

    let manifest = Manifest::load(&path).unwrap();
    assert_eq!(manifest.loader.mode, Mode::Incremental);

    let device = Device::new(manifest.device.capacity_bytes);
    let resources = build_resources(&manifest, &device);
    let labels: Vec<&str> = resources.iter().map(|r| r.label()).collect();
    assert_eq!(labels, vec!["flat-shader", "terrain", "skybox"]);

    assert!(!resources[0].has_gather());
    assert!(resources[1].has_gather());
    assert!(
        resources
            .iter()
            .all(|r| r.gather_status() == GatherStatus::Ungathered)
    );
    assert_eq!(device.live_count(), 0);
}
