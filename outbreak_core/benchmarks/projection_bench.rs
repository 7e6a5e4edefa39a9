use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use outbreak_core::{project, CityRecord, Coordinate, Dataset, DayCounts, Disease, DiseaseFilter, Timeline};

fn synthetic_dataset(cities: usize, days: i64) -> Dataset {
    let origin = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let records = (0..cities)
        .map(|index| {
            let series = (0..days)
                .map(|offset| {
                    let counts: DayCounts = Disease::ALL
                        .iter()
                        .enumerate()
                        .map(|(slot, disease)| (*disease, ((index + slot) as u64 * 7 + offset as u64) % 240))
                        .collect();
                    (origin + Duration::days(offset), counts)
                })
                .collect();
            CityRecord {
                city: format!("city-{index}"),
                coordinate: Coordinate(40.0 + index as f64 * 0.01, 30.0),
                series,
            }
        })
        .collect();
    Dataset::new(records)
}

fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection");

    for cities in [5usize, 50, 500] {
        let dataset = synthetic_dataset(cities, 90);
        let date = NaiveDate::from_ymd_opt(2025, 2, 15).unwrap();
        group.bench_with_input(BenchmarkId::new("all", cities), &dataset, |b, dataset| {
            b.iter(|| project(black_box(dataset), date, DiseaseFilter::All));
        });
        group.bench_with_input(BenchmarkId::new("cholera", cities), &dataset, |b, dataset| {
            b.iter(|| project(black_box(dataset), date, DiseaseFilter::Only(Disease::Cholera)));
        });
        group.bench_with_input(BenchmarkId::new("timeline", cities), &dataset, |b, dataset| {
            b.iter(|| Timeline::build(black_box(dataset.cities())));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_projection);
criterion_main!(benches);
