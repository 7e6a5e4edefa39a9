//! Strict dataset document parsing used by tooling.
//!
//! The panel itself loads datasets leniently (see `outbreak_core::dataset`);
//! this module is the authoring-side check that reports every problem at once.

use std::collections::HashSet;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::CityRecord;

/// On-disk dataset layout: `{ "cities": [ ... ] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DatasetDocument {
    pub cities: Vec<CityRecord>,
}

impl DatasetDocument {
    pub fn parse_str(contents: &str) -> Result<Self, DatasetValidationError> {
        let document: DatasetDocument = serde_json::from_str(contents).map_err(|err| {
            DatasetValidationError::single(format!("failed to parse dataset JSON: {err}"))
        })?;
        document.validate()?;
        Ok(document)
    }

    pub fn validate(&self) -> Result<(), DatasetValidationError> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for (index, record) in self.cities.iter().enumerate() {
            let name = record.city.trim();
            if name.is_empty() {
                errors.push(format!("city #{index} has an empty name"));
            } else if !seen.insert(name.to_ascii_lowercase()) {
                errors.push(format!("city '{name}' is listed more than once"));
            }

            let lon = record.coordinate.lon();
            let lat = record.coordinate.lat();
            if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
                errors.push(format!("city '{name}' has longitude {lon} outside [-180, 180]"));
            }
            if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
                errors.push(format!("city '{name}' has latitude {lat} outside [-90, 90]"));
            }

            if record.series.is_empty() {
                errors.push(format!("city '{name}' has no dated series entries"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DatasetValidationError::new(errors))
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatasetValidationError {
    errors: Vec<String>,
}

impl DatasetValidationError {
    pub fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }

    pub fn single(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

impl fmt::Display for DatasetValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.errors.join("; "))
    }
}

impl std::error::Error for DatasetValidationError {}

pub fn dataset_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(DatasetDocument)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_document() {
        let json = r#"{
            "cities": [
                {
                    "city": "Karbala",
                    "coordinate": [44.39, 32.01],
                    "series": { "2025-10-20": { "Influenza": 20, "COVID-19": 2 } }
                }
            ]
        }"#;
        let document = DatasetDocument::parse_str(json).expect("document should be valid");
        assert_eq!(document.cities.len(), 1);
    }

    #[test]
    fn reports_every_problem() {
        let json = r#"{
            "cities": [
                { "city": "Basra", "coordinate": [47.78, 30.51], "series": {} },
                { "city": "basra", "coordinate": [200.0, 95.0],
                  "series": { "2025-10-20": { "Dengue": 1 } } }
            ]
        }"#;
        let err = DatasetDocument::parse_str(json).expect_err("expected validation failure");
        assert_eq!(err.errors().len(), 4);
        let message = err.to_string();
        assert!(message.contains("no dated series"));
        assert!(message.contains("more than once"));
        assert!(message.contains("longitude 200"));
        assert!(message.contains("latitude 95"));
    }

    #[test]
    fn rejects_unknown_disease_keys() {
        let json = r#"{
            "cities": [
                { "city": "Mosul", "coordinate": [43.684, 36.34],
                  "series": { "2025-10-20": { "Plague": 3 } } }
            ]
        }"#;
        let err = DatasetDocument::parse_str(json).expect_err("expected parse failure");
        assert!(err.to_string().contains("failed to parse dataset JSON"));
    }

    #[test]
    fn schema_names_the_cities_field() {
        let schema = serde_json::to_value(dataset_schema()).unwrap();
        assert!(schema["properties"].get("cities").is_some());
    }
}
