use std::collections::BTreeMap;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use paran_search::{
    AcgEventType, ClosedFormSolver, EphemerisPosition, NumericalHorizonHorizonSolver,
    ParanCalculator, ParanConfiguration, PrecisionTier, SphericalCoordinates,
};

const JD: f64 = 2_460_388.5;

const BODIES: [(&str, f64, f64); 7] = [
    ("Sun", 10.0, 4.0),
    ("Moon", 130.0, 18.0),
    ("Mercury", 355.0, -2.0),
    ("Venus", 40.0, 15.0),
    ("Mars", 250.0, -21.0),
    ("Jupiter", 75.0, 22.0),
    ("Saturn", 330.0, -12.0),
];

fn positions() -> BTreeMap<String, EphemerisPosition> {
    BODIES
        .iter()
        .map(|&(name, ra, dec)| (name.to_string(), EphemerisPosition::new(ra, dec, 1.0, JD)))
        .collect()
}

fn closed_form_bench(c: &mut Criterion) {
    let solver = ClosedFormSolver::new(&ParanConfiguration::default());
    let sun = SphericalCoordinates::from_degrees(10.0, 4.0);
    let moon = SphericalCoordinates::from_degrees(130.0, 18.0);

    let mut group = c.benchmark_group("paran_closed_form");
    group.bench_function("mc_rise", |b| {
        b.iter(|| {
            solver
                .solve_meridian_horizon(
                    AcgEventType::Mc,
                    black_box(&sun),
                    AcgEventType::Rise,
                    black_box(&moon),
                )
                .expect("closed form should solve")
        })
    });
    group.finish();
}

fn horizon_horizon_bench(c: &mut Criterion) {
    let mars = SphericalCoordinates::from_degrees(250.0, -21.0);
    let jupiter = SphericalCoordinates::from_degrees(75.0, 22.0);

    let mut group = c.benchmark_group("paran_horizon_horizon");
    group.sample_size(30);
    for tier in [PrecisionTier::Standard, PrecisionTier::High] {
        let config = ParanConfiguration::for_pairs([("Mars", "Jupiter")]).with_tier(tier);
        let solver = NumericalHorizonHorizonSolver::new(&config).expect("pool should build");
        group.bench_function(format!("rise_set_{tier:?}"), |b| {
            b.iter(|| {
                solver.solve(
                    AcgEventType::Rise,
                    black_box(&mars),
                    AcgEventType::Set,
                    black_box(&jupiter),
                )
            })
        });
    }
    group.finish();
}

fn batch_bench(c: &mut Criterion) {
    let names: Vec<&str> = BODIES.iter().map(|&(n, _, _)| n).collect();
    let config = ParanConfiguration::for_all_pairs(&names).with_tier(PrecisionTier::High);
    let positions = positions();
    let calc = ParanCalculator::new();

    let mut group = c.benchmark_group("paran_batch");
    group.sample_size(10);
    group.bench_function("21_pairs_high", |b| {
        b.iter(|| {
            calc.calculate(black_box(&config), black_box(&positions))
                .expect("batch should run")
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    closed_form_bench,
    horizon_horizon_bench,
    batch_bench
);
criterion_main!(benches);
