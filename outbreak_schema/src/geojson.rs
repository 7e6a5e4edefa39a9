//! GeoJSON view of a projection, in the shape map widgets consume.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{DayCounts, DiseaseFilter, ProjectedFeature};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionKind {
    FeatureCollection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    Feature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    pub city: String,
    pub disease: DiseaseFilter,
    pub cases: u64,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<DayCounts>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    pub geometry: Geometry,
    pub properties: FeatureProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: CollectionKind,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn empty() -> Self {
        Self {
            kind: CollectionKind::FeatureCollection,
            features: Vec::new(),
        }
    }

    pub fn from_projection(features: &[ProjectedFeature]) -> Self {
        Self {
            kind: CollectionKind::FeatureCollection,
            features: features.iter().map(Feature::from).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&ProjectedFeature> for Feature {
    fn from(feature: &ProjectedFeature) -> Self {
        Feature {
            kind: FeatureKind::Feature,
            geometry: Geometry::Point {
                coordinates: [feature.coordinate.lon(), feature.coordinate.lat()],
            },
            properties: FeatureProperties {
                city: feature.city.clone(),
                disease: feature.disease,
                cases: feature.cases,
                date: feature.date,
                breakdown: feature.breakdown.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Coordinate, Disease};

    fn mosul_cholera() -> ProjectedFeature {
        ProjectedFeature {
            city: "Mosul".to_string(),
            coordinate: Coordinate(43.684, 36.34),
            disease: DiseaseFilter::Only(Disease::Cholera),
            cases: 60,
            date: NaiveDate::from_ymd_opt(2025, 10, 22).unwrap(),
            breakdown: None,
        }
    }

    #[test]
    fn collection_serialises_as_geojson() {
        let collection = FeatureCollection::from_projection(&[mosul_cholera()]);
        let value = serde_json::to_value(&collection).unwrap();

        assert_eq!(value["type"], "FeatureCollection");
        let feature = &value["features"][0];
        assert_eq!(feature["type"], "Feature");
        assert_eq!(feature["geometry"]["type"], "Point");
        assert_eq!(feature["geometry"]["coordinates"][0], 43.684);
        assert_eq!(feature["geometry"]["coordinates"][1], 36.34);
        assert!(feature["properties"].get("breakdown").is_none());
    }

    #[test]
    fn single_disease_properties_snapshot() {
        let feature = Feature::from(&mosul_cholera());
        insta::assert_json_snapshot!(feature.properties, @r###"
        {
          "city": "Mosul",
          "disease": "Cholera",
          "cases": 60,
          "date": "2025-10-22"
        }
        "###);
    }

    #[test]
    fn breakdown_survives_a_round_trip() {
        let mut breakdown = DayCounts::new();
        breakdown.insert(Disease::Influenza, 120);
        breakdown.insert(Disease::Covid19, 25);
        let feature = ProjectedFeature {
            disease: DiseaseFilter::All,
            cases: 145,
            breakdown: Some(breakdown.clone()),
            ..mosul_cholera()
        };
        let collection = FeatureCollection::from_projection(&[feature]);
        let json = serde_json::to_string(&collection).unwrap();
        assert!(json.contains("\"COVID-19\":25"));

        let parsed: FeatureCollection = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.features[0].properties.breakdown, Some(breakdown));
        assert_eq!(parsed.features[0].properties.disease, DiseaseFilter::All);
    }
}
