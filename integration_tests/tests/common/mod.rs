#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Once};

use anyhow::{Context, Result};
use rep_core::{load_store_config_from_env, JsonWorkbookTable, ReputationStore, CONFIG_PATH_ENV};
use tempfile::TempDir;

static INIT: Once = Once::new();

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn ensure_test_config() {
    INIT.call_once(|| {
        let config_path = fixture_path("test_store_config.json");

        debug_assert!(
            config_path.exists(),
            "missing test store config at {}",
            config_path.display()
        );

        std::env::set_var(CONFIG_PATH_ENV, &config_path);
    });
}

/// Copy the fixture workbook into a fresh temp dir so writes stay local to
/// one test. The returned dir must outlive the store.
pub fn scratch_workbook() -> Result<(TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("failed to create tempdir")?;
    let path = dir.path().join("workbook.json");
    std::fs::copy(fixture_path("workbook.json"), &path)
        .with_context(|| format!("failed to copy fixture workbook to {}", path.display()))?;
    Ok((dir, path))
}

/// A store over a scratch copy of the fixture workbook, configured from the
/// test store config.
pub fn scratch_store() -> Result<(TempDir, Arc<JsonWorkbookTable>, ReputationStore)> {
    ensure_test_config();
    let (dir, path) = scratch_workbook()?;
    let table = Arc::new(JsonWorkbookTable::open(&path)?);
    let (config, _) = load_store_config_from_env();
    let store = ReputationStore::from_shared(Arc::clone(&table), config);
    Ok((dir, table, store))
}
