use chrono::NaiveDate;

use outbreak_schema::{CitySummary, DerivedStats, ProjectedFeature, RiskLevel, HIGH_RISK_THRESHOLD};

pub fn derive_stats(date: Option<NaiveDate>, features: &[ProjectedFeature]) -> DerivedStats {
    let total_cases = features
        .iter()
        .fold(0u64, |total, feature| total.saturating_add(feature.cases));
    let high_risk_count = features
        .iter()
        .filter(|feature| feature.cases >= HIGH_RISK_THRESHOLD)
        .count();
    let cities = features
        .iter()
        .map(|feature| CitySummary {
            city: feature.city.clone(),
            cases: feature.cases,
            coordinate: feature.coordinate,
            risk: RiskLevel::classify(feature.cases),
        })
        .collect();

    DerivedStats {
        date,
        total_cases,
        high_risk_count,
        cities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outbreak_schema::{Coordinate, DiseaseFilter};

    fn feature(city: &str, cases: u64) -> ProjectedFeature {
        ProjectedFeature {
            city: city.to_string(),
            coordinate: Coordinate(44.0, 33.0),
            disease: DiseaseFilter::All,
            cases,
            date: NaiveDate::from_ymd_opt(2025, 10, 20).unwrap(),
            breakdown: None,
        }
    }

    #[test]
    fn counts_high_risk_at_threshold() {
        let features = [feature("a", 250), feature("b", 150), feature("c", 500)];
        let stats = derive_stats(None, &features);
        assert_eq!(stats.high_risk_count, 2);
        assert_eq!(stats.total_cases, 900);
        assert_eq!(stats.cities[1].risk, RiskLevel::Mid);
    }

    #[test]
    fn total_saturates_on_huge_counts() {
        let features = [feature("a", u64::MAX), feature("b", 7)];
        let stats = derive_stats(None, &features);
        assert_eq!(stats.total_cases, u64::MAX);
        assert_eq!(stats.high_risk_count, 2);
    }

    #[test]
    fn empty_projection_is_all_zero() {
        let stats = derive_stats(None, &[]);
        assert_eq!(stats, DerivedStats::default());
        assert_eq!(stats.tracked_diseases(), 5);
    }
}
