//! Criterion benchmarks for heatmap grid generation.
//!
//! Measures sampling and fast scoring across the zoom tiers, and a full
//! uncached `generate_area` call through the generator.
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench --package safepath-heatmap
//! ```

// Criterion macros generate code that triggers missing_docs warnings.
#![allow(missing_docs, reason = "Criterion macros generate undocumented code")]

use std::hint::black_box;
use std::sync::Arc;

use chrono::DateTime;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use safepath_core::test_support::ManualScheduler;
use safepath_core::{Bounds, FeatureFlags, HeatmapPoint, PerformanceTier, StaticFeatureFlags};
use safepath_heatmap::{FastHeuristicScore, GridHeatmapGenerator, Resolution, grid_shape, sample_points};

/// Seed for the jitter generator.
const BENCHMARK_SEED: u64 = 42;

/// Zoom levels covering every resolution tier.
const ZOOM_LEVELS: &[f64] = &[10.0, 12.0, 14.0, 16.0, 18.0];

/// A central-London viewport roughly 2 km across.
fn viewport() -> Option<Bounds> {
    Bounds::new(51.5150, 51.4970, -0.1100, -0.1450).ok()
}

fn bench_sampling(c: &mut Criterion) {
    let Some(bounds) = viewport() else {
        return;
    };
    let Ok(at) = DateTime::parse_from_rfc3339("2024-05-01T18:30:00+01:00") else {
        return;
    };
    let scorer = FastHeuristicScore::default();
    let mut group = c.benchmark_group("grid_sampling");

    for &zoom in ZOOM_LEVELS {
        let resolution = Resolution::for_zoom(zoom).adapted(PerformanceTier::High);
        let (rows, cols) = grid_shape(&bounds, resolution);
        group.throughput(Throughput::Elements(
            u64::try_from(rows * cols).unwrap_or(u64::MAX),
        ));
        group.bench_with_input(BenchmarkId::from_parameter(zoom), &zoom, |b, &zoom| {
            b.iter(|| {
                let mut rng = ChaCha8Rng::seed_from_u64(BENCHMARK_SEED);
                let points: Vec<HeatmapPoint> =
                    sample_points(&bounds, rows, cols, 0.3, &mut rng)
                        .into_iter()
                        .map(|p| HeatmapPoint::new(p, scorer.score(p, at), zoom, at))
                        .collect();
                black_box(points)
            });
        });
    }
    group.finish();
}

fn bench_generate_area(c: &mut Criterion) {
    let Some(bounds) = viewport() else {
        return;
    };
    let Ok(runtime) = tokio::runtime::Builder::new_current_thread().build() else {
        return;
    };
    let flags: Arc<dyn FeatureFlags> = Arc::new(StaticFeatureFlags::new(true));
    let generator = GridHeatmapGenerator::new(flags, Arc::new(ManualScheduler::default()));

    c.bench_function("generate_area_uncached", |b| {
        b.iter(|| {
            generator.clear();
            black_box(runtime.block_on(generator.generate_area(bounds, 18.0)))
        });
    });
}

criterion_group!(benches, bench_sampling, bench_generate_area);
criterion_main!(benches);
