mod common;

use outbreak_core::dataset::BUILTIN_DATASET;
use outbreak_core::{
    derive_stats, load_dataset_from_env, project, DatasetSource, DiseaseFilter, Timeline,
};
use outbreak_schema::DatasetDocument;

#[test]
fn malformed_days_are_dropped_not_fatal() -> anyhow::Result<()> {
    let (dataset, report) = common::sparse_dataset()?;
    assert_eq!(dataset.cities().len(), 3);

    let mut dropped: Vec<(&str, &str)> = report
        .dropped
        .iter()
        .map(|day| (day.city.as_str(), day.key.as_str()))
        .collect();
    dropped.sort();
    assert_eq!(
        dropped,
        vec![
            ("Alpha", "01/02/2025"),
            ("Beta", "2025-01-03"),
            ("Gamma", "2025-01-03"),
        ]
    );

    let timeline = Timeline::build(dataset.cities());
    assert_eq!(
        timeline.steps(),
        &[
            common::date(2025, 1, 1),
            common::date(2025, 1, 2),
            common::date(2025, 1, 3)
        ]
    );
    Ok(())
}

#[test]
fn dropped_entries_keep_the_rest_of_the_day() -> anyhow::Result<()> {
    let (dataset, report) = common::sparse_dataset()?;
    let gamma_drop = report
        .dropped
        .iter()
        .find(|entry| entry.city == "Gamma")
        .and_then(|entry| entry.disease.as_deref());
    assert_eq!(gamma_drop, Some("Plague"));

    let date = common::date(2025, 1, 3);
    let features = project(&dataset, date, DiseaseFilter::All);
    let cities: Vec<(&str, u64)> = features
        .iter()
        .map(|feature| (feature.city.as_str(), feature.cases))
        .collect();
    assert_eq!(cities, vec![("Gamma", 90)]);

    let stats = derive_stats(Some(date), &features);
    assert_eq!(stats.total_cases, 90);
    assert_eq!(stats.high_risk_count, 0);
    Ok(())
}

#[test]
fn env_override_selects_dataset_file() {
    common::ensure_sparse_dataset_env();
    let (dataset, source) = load_dataset_from_env();
    assert_eq!(
        source,
        DatasetSource::File(common::fixture_path("sparse_dataset.json"))
    );
    assert!(dataset.city("Gamma").is_some());
}

#[test]
fn strict_validation_accepts_builtin_and_rejects_sparse_fixture() -> anyhow::Result<()> {
    let document = DatasetDocument::parse_str(BUILTIN_DATASET)?;
    assert_eq!(document.cities.len(), 5);

    let sparse = std::fs::read_to_string(common::fixture_path("sparse_dataset.json"))?;
    assert!(DatasetDocument::parse_str(&sparse).is_err());
    Ok(())
}
