//! Data contracts for the outbreak map panel.
//!
//! Everything in this crate is plain data: the fixed disease catalogue, the
//! per-city time series the panel is loaded from, the projected features it
//! hands to a renderer, and the summary statistics derived from them. The
//! behaviour lives in `outbreak_core`.

mod geojson;
mod validation;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub use geojson::{CollectionKind, Feature, FeatureCollection, FeatureKind, FeatureProperties, Geometry};
pub use validation::{dataset_schema, DatasetDocument, DatasetValidationError};

/// Cases at or above this count mark a city as high risk.
pub const HIGH_RISK_THRESHOLD: u64 = 200;
/// Cases at or above this count (and below [`HIGH_RISK_THRESHOLD`]) mark a city as mid risk.
pub const MID_RISK_THRESHOLD: u64 = 80;

/// Diseases tracked by the panel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum Disease {
    Influenza,
    Cholera,
    Measles,
    Dengue,
    #[serde(rename = "COVID-19")]
    Covid19,
}

impl Disease {
    pub const ALL: [Disease; 5] = [
        Disease::Influenza,
        Disease::Cholera,
        Disease::Measles,
        Disease::Dengue,
        Disease::Covid19,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Disease::Influenza => "Influenza",
            Disease::Cholera => "Cholera",
            Disease::Measles => "Measles",
            Disease::Dengue => "Dengue",
            Disease::Covid19 => "COVID-19",
        }
    }

    /// Legend colour used for point markers of this disease.
    pub fn legend_rgb(self) -> (u8, u8, u8) {
        match self {
            Disease::Influenza => (0xFF, 0x44, 0x44),
            Disease::Cholera => (0xFF, 0xA5, 0x00),
            Disease::Measles => (0x7C, 0x3A, 0xED),
            Disease::Dengue => (0x05, 0x96, 0x69),
            Disease::Covid19 => (0xF9, 0x73, 0x16),
        }
    }
}

impl fmt::Display for Disease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown disease '{0}'")]
pub struct UnknownDisease(pub String);

impl FromStr for Disease {
    type Err = UnknownDisease;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Disease::ALL
            .into_iter()
            .find(|disease| disease.name().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownDisease(value.to_string()))
    }
}

/// Which diseases a projection covers: every disease summed, or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DiseaseFilter {
    #[default]
    All,
    Only(Disease),
}

impl DiseaseFilter {
    /// Selector order shown to users: `All` first, then the catalogue.
    pub const CHOICES: [DiseaseFilter; 6] = [
        DiseaseFilter::All,
        DiseaseFilter::Only(Disease::Influenza),
        DiseaseFilter::Only(Disease::Cholera),
        DiseaseFilter::Only(Disease::Measles),
        DiseaseFilter::Only(Disease::Dengue),
        DiseaseFilter::Only(Disease::Covid19),
    ];

    pub fn name(self) -> &'static str {
        match self {
            DiseaseFilter::All => "All",
            DiseaseFilter::Only(disease) => disease.name(),
        }
    }

    pub fn disease(self) -> Option<Disease> {
        match self {
            DiseaseFilter::All => None,
            DiseaseFilter::Only(disease) => Some(disease),
        }
    }

    /// Neighbouring choice in [`Self::CHOICES`], wrapping at both ends.
    pub fn cycle(self, forward: bool) -> DiseaseFilter {
        let len = Self::CHOICES.len();
        let pos = Self::CHOICES
            .iter()
            .position(|choice| *choice == self)
            .unwrap_or(0);
        let next = if forward {
            (pos + 1) % len
        } else {
            (pos + len - 1) % len
        };
        Self::CHOICES[next]
    }

    /// Marker colour; `All` uses the aggregate purple.
    pub fn legend_rgb(self) -> (u8, u8, u8) {
        match self {
            DiseaseFilter::All => (0x8B, 0x5C, 0xF6),
            DiseaseFilter::Only(disease) => disease.legend_rgb(),
        }
    }
}

impl fmt::Display for DiseaseFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DiseaseFilter {
    type Err = UnknownDisease;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(DiseaseFilter::All);
        }
        value.parse().map(DiseaseFilter::Only)
    }
}

impl Serialize for DiseaseFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for DiseaseFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Case counts for one city on one day.
pub type DayCounts = BTreeMap<Disease, u64>;

/// Longitude/latitude pair, serialised as `[lon, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Coordinate(pub f64, pub f64);

impl Coordinate {
    pub fn lon(&self) -> f64 {
        self.0
    }

    pub fn lat(&self) -> f64 {
        self.1
    }
}

/// A city and its per-day, per-disease case counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CityRecord {
    pub city: String,
    pub coordinate: Coordinate,
    #[serde(default)]
    pub series: BTreeMap<NaiveDate, DayCounts>,
}

impl CityRecord {
    pub fn day(&self, date: NaiveDate) -> Option<&DayCounts> {
        self.series.get(&date)
    }
}

/// One city's contribution to a projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedFeature {
    pub city: String,
    pub coordinate: Coordinate,
    pub disease: DiseaseFilter,
    pub cases: u64,
    pub date: NaiveDate,
    /// Full per-disease counts; only attached for [`DiseaseFilter::All`].
    pub breakdown: Option<DayCounts>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Mid,
    High,
}

impl RiskLevel {
    pub fn classify(cases: u64) -> Self {
        if cases >= HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else if cases >= MID_RISK_THRESHOLD {
            RiskLevel::Mid
        } else {
            RiskLevel::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Mid => "Mid",
            RiskLevel::High => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySummary {
    pub city: String,
    pub cases: u64,
    pub coordinate: Coordinate,
    pub risk: RiskLevel,
}

/// Summary of the active projection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DerivedStats {
    pub date: Option<NaiveDate>,
    pub total_cases: u64,
    pub high_risk_count: usize,
    pub cities: Vec<CitySummary>,
}

impl DerivedStats {
    /// Number of diseases in the catalogue, shown as "observed diseases".
    pub fn tracked_diseases(&self) -> usize {
        Disease::ALL.len()
    }
}

/// Reference card shown next to the map for the active filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiseaseInfo {
    pub incubation: &'static str,
    pub transmission: &'static str,
    pub vaccination: &'static str,
    pub prevention: &'static str,
}

pub fn disease_info(filter: DiseaseFilter) -> &'static DiseaseInfo {
    const ALL: DiseaseInfo = DiseaseInfo {
        incubation: "Varies",
        transmission: "Multiple modes",
        vaccination: "Varies",
        prevention: "Hygiene, surveillance",
    };
    const INFLUENZA: DiseaseInfo = DiseaseInfo {
        incubation: "1 - 4 days",
        transmission: "Airborne droplets",
        vaccination: "Available",
        prevention: "Vaccination, masks, hand hygiene",
    };
    const CHOLERA: DiseaseInfo = DiseaseInfo {
        incubation: "1 - 5 days",
        transmission: "Contaminated water/food",
        vaccination: "Available (oral)",
        prevention: "Clean water, sanitation",
    };
    const MEASLES: DiseaseInfo = DiseaseInfo {
        incubation: "10 - 14 days",
        transmission: "Airborne droplets",
        vaccination: "Available (MMR)",
        prevention: "Vaccination, isolation",
    };
    const DENGUE: DiseaseInfo = DiseaseInfo {
        incubation: "4 - 10 days",
        transmission: "Mosquito-borne",
        vaccination: "Limited",
        prevention: "Mosquito control, nets",
    };
    const COVID: DiseaseInfo = DiseaseInfo {
        incubation: "2 - 14 days",
        transmission: "Airborne droplets & aerosols",
        vaccination: "Available",
        prevention: "Vaccination, masks, distancing",
    };

    match filter {
        DiseaseFilter::All => &ALL,
        DiseaseFilter::Only(Disease::Influenza) => &INFLUENZA,
        DiseaseFilter::Only(Disease::Cholera) => &CHOLERA,
        DiseaseFilter::Only(Disease::Measles) => &MEASLES,
        DiseaseFilter::Only(Disease::Dengue) => &DENGUE,
        DiseaseFilter::Only(Disease::Covid19) => &COVID,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disease_names_round_trip_through_from_str() {
        for disease in Disease::ALL {
            assert_eq!(disease.name().parse::<Disease>().unwrap(), disease);
        }
        assert_eq!("covid-19".parse::<Disease>().unwrap(), Disease::Covid19);
        assert!("Plague".parse::<Disease>().is_err());
    }

    #[test]
    fn filter_wire_form_is_display_string() {
        let json = serde_json::to_string(&DiseaseFilter::Only(Disease::Covid19)).unwrap();
        assert_eq!(json, "\"COVID-19\"");
        let all: DiseaseFilter = serde_json::from_str("\"All\"").unwrap();
        assert_eq!(all, DiseaseFilter::All);
        assert!(serde_json::from_str::<DiseaseFilter>("\"Plague\"").is_err());
    }

    #[test]
    fn filter_cycle_wraps_both_ways() {
        assert_eq!(
            DiseaseFilter::All.cycle(true),
            DiseaseFilter::Only(Disease::Influenza)
        );
        assert_eq!(
            DiseaseFilter::All.cycle(false),
            DiseaseFilter::Only(Disease::Covid19)
        );
        assert_eq!(
            DiseaseFilter::Only(Disease::Covid19).cycle(true),
            DiseaseFilter::All
        );
    }

    #[test]
    fn risk_levels_follow_thresholds() {
        assert_eq!(RiskLevel::classify(0), RiskLevel::Low);
        assert_eq!(RiskLevel::classify(79), RiskLevel::Low);
        assert_eq!(RiskLevel::classify(80), RiskLevel::Mid);
        assert_eq!(RiskLevel::classify(199), RiskLevel::Mid);
        assert_eq!(RiskLevel::classify(200), RiskLevel::High);
    }

    #[test]
    fn city_record_parses_disease_keyed_days() {
        let json = r#"{
            "city": "Basra",
            "coordinate": [47.78, 30.51],
            "series": {
                "2025-10-20": { "Dengue": 60, "COVID-19": 2 }
            }
        }"#;
        let record: CityRecord = serde_json::from_str(json).unwrap();
        let day = record
            .day(NaiveDate::from_ymd_opt(2025, 10, 20).unwrap())
            .unwrap();
        assert_eq!(day.get(&Disease::Dengue), Some(&60));
        assert_eq!(day.get(&Disease::Covid19), Some(&2));
        assert_eq!(record.coordinate.lon(), 47.78);
    }

    #[test]
    fn disease_info_covers_aggregate_and_single_filters() {
        assert_eq!(disease_info(DiseaseFilter::All).incubation, "Varies");
        assert_eq!(
            disease_info(DiseaseFilter::Only(Disease::Measles)).vaccination,
            "Available (MMR)"
        );
    }
}
