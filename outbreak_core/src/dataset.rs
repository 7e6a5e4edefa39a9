//! Per-city outbreak dataset.
//!
//! Loaded from `outbreak_dataset.json` with support for an environment
//! variable override. Loading is lenient: a day whose key is not an ISO date
//! or whose value is not an object is dropped and reported, so the city simply
//! has no data for that date. Within a day, an entry with an unknown disease
//! or a count that is not a non-negative integer is dropped on its own and
//! the rest of the day is kept. `null` counts are treated as absent.

use std::{
    collections::BTreeMap,
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use outbreak_schema::{CityRecord, Coordinate, DayCounts, Disease};

pub const BUILTIN_DATASET: &str = include_str!("data/outbreak_dataset.json");

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    cities: Vec<CityRecord>,
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    #[serde(default)]
    cities: Vec<RawCityRecord>,
}

#[derive(Debug, Deserialize)]
struct RawCityRecord {
    city: String,
    coordinate: Coordinate,
    #[serde(default)]
    series: BTreeMap<String, serde_json::Value>,
}

/// A series entry that was skipped while loading. `disease` is set when only
/// one count was dropped and the rest of the day survived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedEntry {
    pub city: String,
    pub key: String,
    pub disease: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub dropped: Vec<DroppedEntry>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to parse outbreak dataset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read outbreak dataset from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Dataset {
    pub fn new(cities: Vec<CityRecord>) -> Self {
        Self { cities }
    }

    pub fn builtin() -> Arc<Self> {
        let (dataset, _) =
            Dataset::from_json_str(BUILTIN_DATASET).expect("builtin outbreak dataset should parse");
        Arc::new(dataset)
    }

    pub fn from_json_str(json: &str) -> Result<(Self, LoadReport), DatasetError> {
        let raw: RawDataset = serde_json::from_str(json)?;
        let mut report = LoadReport::default();
        let cities = raw
            .cities
            .into_iter()
            .map(|record| convert_record(record, &mut report))
            .collect();
        Ok((Self { cities }, report))
    }

    pub fn from_file(path: &Path) -> Result<(Self, LoadReport), DatasetError> {
        let contents = fs::read_to_string(path).map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Dataset::from_json_str(&contents)
    }

    pub fn cities(&self) -> &[CityRecord] {
        &self.cities
    }

    pub fn city(&self, name: &str) -> Option<&CityRecord> {
        self.cities.iter().find(|record| record.city == name)
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

fn convert_record(raw: RawCityRecord, report: &mut LoadReport) -> CityRecord {
    let mut series = BTreeMap::new();
    for (key, value) in raw.series {
        let date = match NaiveDate::parse_from_str(&key, DATE_FORMAT) {
            Ok(date) => date,
            Err(err) => {
                drop_entry(report, &raw.city, &key, None, format!("invalid date key: {err}"));
                continue;
            }
        };
        let serde_json::Value::Object(entries) = value else {
            drop_entry(report, &raw.city, &key, None, "day is not an object".to_string());
            continue;
        };
        let counts = convert_day(&raw.city, &key, entries, report);
        series.insert(date, counts);
    }
    CityRecord {
        city: raw.city,
        coordinate: raw.coordinate,
        series,
    }
}

fn convert_day(
    city: &str,
    key: &str,
    entries: serde_json::Map<String, serde_json::Value>,
    report: &mut LoadReport,
) -> DayCounts {
    let mut counts = DayCounts::new();
    for (name, value) in entries {
        let disease = match name.parse::<Disease>() {
            Ok(disease) => disease,
            Err(err) => {
                drop_entry(report, city, key, Some(name), err.to_string());
                continue;
            }
        };
        match value {
            serde_json::Value::Null => {}
            value => match value.as_u64() {
                Some(cases) => {
                    counts.insert(disease, cases);
                }
                None => drop_entry(
                    report,
                    city,
                    key,
                    Some(name),
                    format!("invalid count: {value}"),
                ),
            },
        }
    }
    counts
}

fn drop_entry(
    report: &mut LoadReport,
    city: &str,
    key: &str,
    disease: Option<String>,
    reason: String,
) {
    tracing::warn!(
        target: "outbreak::dataset",
        city,
        key,
        disease = disease.as_deref().unwrap_or("*"),
        reason = %reason,
        "dataset.entry_dropped"
    );
    report.dropped.push(DroppedEntry {
        city: city.to_string(),
        key: key.to_string(),
        disease,
        reason,
    });
}

/// Where the active dataset came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    Builtin,
    File(PathBuf),
}

/// Load the dataset named by `OUTBREAK_DATASET_PATH`, falling back to the builtin copy.
pub fn load_dataset_from_env() -> (Arc<Dataset>, DatasetSource) {
    if let Some(path) = env::var("OUTBREAK_DATASET_PATH").ok().map(PathBuf::from) {
        match Dataset::from_file(&path) {
            Ok((dataset, report)) => {
                tracing::info!(
                    target: "outbreak::dataset",
                    path = %path.display(),
                    cities = dataset.cities().len(),
                    dropped = report.dropped.len(),
                    "dataset.loaded=file"
                );
                return (Arc::new(dataset), DatasetSource::File(path));
            }
            Err(err) => {
                tracing::warn!(
                    target: "outbreak::dataset",
                    path = %path.display(),
                    error = %err,
                    "dataset.load_failed"
                );
            }
        }
    }

    let dataset = Dataset::builtin();
    tracing::info!(
        target: "outbreak::dataset",
        cities = dataset.cities().len(),
        "dataset.loaded=builtin"
    );
    (dataset, DatasetSource::Builtin)
}
