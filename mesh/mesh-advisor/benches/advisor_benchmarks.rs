//! Benchmarks for mesh-advisor operations.
//!
//! Run with: cargo bench -p mesh-advisor
//!
//! To compare against baseline:
//! 1. First run: cargo bench -p mesh-advisor -- --save-baseline main
//! 2. After changes: cargo bench -p mesh-advisor -- --baseline main

#![allow(missing_docs, clippy::cast_precision_loss)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use mesh_advisor::{
    AdvisorConfig, ElementSignals, ErrorSet, RiskLevel, map_actions, recommend_elements,
};

// =============================================================================
// Test Data Generation
// =============================================================================

const CODES: [&str; 8] = [
    "BAD_ASPECT_RATIO",
    "HIGH_SKEWNESS",
    "CAD_DEVIATION_HIGH",
    "BAD_TRANSITION",
    "SMALL_AREA",
    "MISSING_NEIGHBOR",
    "ORPHAN_NODE",
    "WARPED_ELEMENT",
];

/// Deterministic mix of signals covering every policy branch.
fn create_signals(count: usize) -> Vec<ElementSignals> {
    (0..count)
        .map(|i| {
            let score = ((i * 37) % 100) as f64 / 250.0 - 0.1;
            let intrinsic = [CODES[i % 5]];
            let cad: Vec<&str> = if i % 11 == 0 {
                vec![CODES[5 + i % 3]]
            } else if i % 3 == 0 {
                vec![CODES[2]]
            } else {
                Vec::new()
            };
            let signals = ElementSignals::new(i as u64, score)
                .with_intrinsic_errors(intrinsic)
                .with_cad_errors(cad);

            match i % 4 {
                0 => signals.with_risk_level(RiskLevel::High),
                1 => signals.with_risk_level(RiskLevel::Medium),
                2 => signals,
                _ => signals.with_risk_level(RiskLevel::Low),
            }
        })
        .collect()
}

// =============================================================================
// Mapper Benchmarks
// =============================================================================

fn bench_mapper(c: &mut Criterion) {
    let mut group = c.benchmark_group("Mapper");

    let intrinsic: ErrorSet = ["BAD_TRANSITION", "SMALL_AREA"].into_iter().collect();
    let cad: ErrorSet = ["CAD_DEVIATION_HIGH"].into_iter().collect();

    group.bench_function("map_actions_medium", |b| {
        b.iter(|| {
            map_actions(
                black_box(&intrinsic),
                black_box(&cad),
                black_box(0.07),
                black_box(&RiskLevel::Medium),
            )
        });
    });

    let empty = ErrorSet::new();
    group.bench_function("map_actions_fallback", |b| {
        b.iter(|| {
            map_actions(
                black_box(&empty),
                black_box(&empty),
                black_box(0.0),
                black_box(&RiskLevel::High),
            )
        });
    });

    group.finish();
}

// =============================================================================
// Batch Benchmarks
// =============================================================================

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("Batch");
    let config = AdvisorConfig::default();

    for count in [1_000usize, 10_000, 100_000] {
        let signals = create_signals(count);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(
            BenchmarkId::new("recommend_elements", count),
            &signals,
            |b, signals| {
                b.iter(|| recommend_elements(black_box(signals), black_box(&config)));
            },
        );
    }

    group.finish();
}

// =============================================================================
// Criterion Setup
// =============================================================================

criterion_group!(benches, bench_mapper, bench_batch);

criterion_main!(benches);
