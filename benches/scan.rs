use {
    chrono::{Duration, NaiveDate},
    criterion::{black_box, criterion_group, criterion_main, Benchmark, Criterion},
    rep_period::{
        binning::{Sector, Selection, SpeedClass},
        observations::{Observation, ObservationTable},
        ranking::rank,
        scan::{scan, ScanPlan},
        window::Frequency,
    },
};

pub fn criterion_benchmark(c: &mut Criterion) {
    let start = NaiveDate::from_ymd_opt(2015, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap();

    // Three years of hourly observations
    let table = ObservationTable::new(
        (0..3 * 8760)
            .map(|h: i64| {
                Observation::new(
                    start + Duration::hours(h),
                    ((h * 13) % 120) as f64 / 10.0,
                    ((h * 37) % 360) as f64,
                )
            })
            .collect(),
    );

    let plan = ScanPlan {
        selection: Selection::new(
            vec![Sector::SSE, Sector::S, Sector::SSW, Sector::SW],
            (3..=6).filter_map(SpeedClass::new).collect(),
        )
        .unwrap(),
        reference_start: start,
        reference_end: start + Duration::days(3 * 365 - 1),
        frequencies: vec![Frequency::new(2).unwrap(), Frequency::new(5).unwrap()],
        scan_start: start + Duration::days(365),
        scan_end: start + Duration::days(365 + 30),
    };

    c.bench(
        "scan",
        Benchmark::new("3y_30d", move |b| {
            b.iter(|| rank(scan(black_box(&table), black_box(&plan))))
        })
        .sample_size(10),
    );
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
