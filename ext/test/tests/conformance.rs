//! Conformance tests that run YAML fixtures against tokenstring
//!
//! Run with: cargo test -p tokenstring-test --test conformance --features tokenstring-test/fixtures
//!
//! Note: This test file requires the `fixtures` feature to be enabled.

#![cfg(feature = "fixtures")]

use std::fs;
use std::path::{Path, PathBuf};
use tokenstring_test::config_fixture::ConfigFixture;
use tokenstring_test::fixture::Fixture;

/// Get the fixtures directory relative to the workspace root
fn fixtures_dir() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir)
        .parent() // ext
        .and_then(|p| p.parent()) // workspace root
        .expect("Could not find workspace root")
        .join("fixtures")
}

/// YAML files in `dir`, sorted by name
fn yaml_files(dir: &Path) -> Vec<PathBuf> {
    assert!(
        dir.exists(),
        "Fixtures directory does not exist: {}",
        dir.display()
    );
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").path())
        .filter(|path| {
            path.extension()
                .is_some_and(|e| e == "yaml" || e == "yml")
        })
        .collect();
    files.sort();
    assert!(!files.is_empty(), "No fixtures in {}", dir.display());
    files
}

/// Load and run all fixtures in a directory
fn run_fixtures_in_dir(dir: &Path) {
    for path in yaml_files(dir) {
        println!("Running fixture: {}", path.display());
        let yaml = fs::read_to_string(&path).expect("read yaml");

        // Parse potentially multiple fixtures (separated by ---)
        let fixtures = Fixture::from_yaml_multi(&yaml).unwrap_or_else(|e| {
            panic!("Failed to parse {}: {}", path.display(), e);
        });

        for fixture in fixtures {
            println!("  Running: {}", fixture.name);
            fixture.run_and_assert();
        }
    }
}

/// Load and run all config fixtures in a directory
fn run_config_fixtures(dir: &Path) {
    for path in yaml_files(dir) {
        println!("Loading config fixture: {}", path.display());
        let yaml = fs::read_to_string(&path).expect("read yaml");

        let fixtures = ConfigFixture::from_yaml_multi(&yaml).unwrap_or_else(|e| {
            panic!("Failed to parse {}: {}", path.display(), e);
        });

        for fixture in fixtures {
            println!("  Running: {}", fixture.name);
            fixture.run_and_assert();
        }
    }
}

#[test]
fn test_render() {
    run_fixtures_in_dir(&fixtures_dir().join("01_render"));
}

#[test]
fn test_match() {
    run_fixtures_in_dir(&fixtures_dir().join("02_match"));
}

#[test]
fn test_config() {
    run_config_fixtures(&fixtures_dir().join("03_config"));
}
