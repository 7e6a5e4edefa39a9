#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Once};

use chrono::NaiveDate;
use outbreak_core::{Dataset, LoadReport};

static INIT: Once = Once::new();

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Point `OUTBREAK_DATASET_PATH` at the sparse fixture for env-driven loading.
pub fn ensure_sparse_dataset_env() {
    INIT.call_once(|| {
        let path = fixture_path("sparse_dataset.json");
        debug_assert!(path.exists(), "missing fixture at {}", path.display());
        std::env::set_var("OUTBREAK_DATASET_PATH", &path);
    });
}

pub fn sparse_dataset() -> anyhow::Result<(Arc<Dataset>, LoadReport)> {
    let (dataset, report) = Dataset::from_file(&fixture_path("sparse_dataset.json"))?;
    Ok((Arc::new(dataset), report))
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}
