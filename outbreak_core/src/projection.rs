//! Disease-scoped projection of the dataset for a single date.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::NaiveDate;

use outbreak_schema::{DiseaseFilter, FeatureCollection, ProjectedFeature};

use crate::dataset::Dataset;

/// Point features for `date` under `filter`.
///
/// Cities without an entry for `date` are skipped rather than reported as
/// zero, and only cities with a positive count for the filter are emitted.
/// The "All" total saturates at `u64::MAX`.
pub fn project(dataset: &Dataset, date: NaiveDate, filter: DiseaseFilter) -> Vec<ProjectedFeature> {
    dataset
        .cities()
        .iter()
        .filter_map(|record| {
            let day = record.day(date)?;
            let (cases, breakdown) = match filter {
                DiseaseFilter::All => (
                    day.values().fold(0u64, |total, cases| total.saturating_add(*cases)),
                    Some(day.clone()),
                ),
                DiseaseFilter::Only(disease) => (day.get(&disease).copied().unwrap_or(0), None),
            };
            (cases > 0).then(|| ProjectedFeature {
                city: record.city.clone(),
                coordinate: record.coordinate,
                disease: filter,
                cases,
                date,
                breakdown,
            })
        })
        .collect()
}

/// Memoises the most recent projection.
#[derive(Debug)]
pub struct Projector {
    dataset: Arc<Dataset>,
    last: Option<(NaiveDate, DiseaseFilter, Arc<[ProjectedFeature]>)>,
}

impl Projector {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self {
            dataset,
            last: None,
        }
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn project(&mut self, date: NaiveDate, filter: DiseaseFilter) -> Arc<[ProjectedFeature]> {
        if let Some((cached_date, cached_filter, features)) = &self.last {
            if *cached_date == date && *cached_filter == filter {
                return Arc::clone(features);
            }
        }
        let features: Arc<[ProjectedFeature]> = project(&self.dataset, date, filter).into();
        self.last = Some((date, filter, Arc::clone(&features)));
        features
    }

    pub fn feature_collection(&mut self, date: NaiveDate, filter: DiseaseFilter) -> FeatureCollection {
        FeatureCollection::from_projection(&self.project(date, filter))
    }
}

/// Popup text for a feature: city, date, cases and the per-disease breakdown.
pub fn describe_feature(feature: &ProjectedFeature) -> String {
    let mut text = format!(
        "{}\nDate: {}\nCases: {}",
        feature.city, feature.date, feature.cases
    );
    if let Some(breakdown) = &feature.breakdown {
        text.push_str("\nBreakdown:");
        for (disease, cases) in breakdown {
            let _ = write!(text, "\n  {disease}: {cases}");
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use outbreak_schema::Disease;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    #[test]
    fn all_filter_sums_and_attaches_breakdown() {
        let dataset = Dataset::builtin();
        let features = project(&dataset, day(20), DiseaseFilter::All);
        assert_eq!(features.len(), 5);

        let baghdad = features.iter().find(|f| f.city == "Baghdad").unwrap();
        assert_eq!(baghdad.cases, 120 + 2 + 25);
        let breakdown = baghdad.breakdown.as_ref().unwrap();
        assert_eq!(breakdown.values().sum::<u64>(), baghdad.cases);
    }

    #[test]
    fn single_disease_keeps_positive_cities_only() {
        let dataset = Dataset::builtin();
        let features = project(&dataset, day(22), DiseaseFilter::Only(Disease::Cholera));
        let cities: Vec<(&str, u64)> = features
            .iter()
            .map(|f| (f.city.as_str(), f.cases))
            .collect();
        assert_eq!(cities, vec![("Mosul", 60), ("Amarah", 170)]);
        assert!(features.iter().all(|f| f.breakdown.is_none()));
    }

    #[test]
    fn missing_date_excludes_city() {
        let dataset = Dataset::builtin();
        assert!(project(&dataset, day(25), DiseaseFilter::All).is_empty());
    }

    #[test]
    fn all_total_saturates_instead_of_overflowing() {
        let json = r#"{"cities": [{
            "city": "Kirkuk",
            "coordinate": [44.392, 35.468],
            "series": { "2025-10-20": { "Influenza": 18446744073709551615, "Cholera": 1 } }
        }]}"#;
        let (dataset, report) = Dataset::from_json_str(json).unwrap();
        assert!(report.is_clean());

        let features = project(&dataset, day(20), DiseaseFilter::All);
        assert_eq!(features[0].cases, u64::MAX);
        let cholera = project(&dataset, day(20), DiseaseFilter::Only(Disease::Cholera));
        assert_eq!(cholera[0].cases, 1);
    }

    #[test]
    fn projector_reuses_last_projection() {
        let mut projector = Projector::new(Dataset::builtin());
        let first = projector.project(day(21), DiseaseFilter::All);
        let again = projector.project(day(21), DiseaseFilter::All);
        assert!(Arc::ptr_eq(&first, &again));

        let other = projector.project(day(21), DiseaseFilter::Only(Disease::Dengue));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn description_lists_breakdown_lines() {
        let dataset = Dataset::builtin();
        let features = project(&dataset, day(24), DiseaseFilter::All);
        let basra = features.iter().find(|f| f.city == "Basra").unwrap();
        let text = describe_feature(basra);
        assert!(text.starts_with("Basra\nDate: 2025-10-24\nCases: 288"));
        assert!(text.contains("  Dengue: 230"));
        assert!(text.contains("  COVID-19: 8"));
    }
}
