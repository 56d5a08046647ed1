//! Criterion benchmarks for drift_core path generation
//!
//! Run with: cargo bench -p drift_core

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use drift_core::config::{SimulationConfig, SimulationModel};
use drift_core::estimate::{DiffusionParams, ModelParameters, ReturnPool};
use drift_core::model::SimulatedPath;
use drift_core::paths::PathGenerator;
use drift_core::pool::WorkerPool;
use drift_core::stats::compute_stats;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn create_config(model: SimulationModel, num_paths: usize) -> SimulationConfig {
    SimulationConfig {
        model,
        num_paths,
        horizon_days: 2520,
        lookback_days: 756,
        start_value: 100_000.0,
        seed: Some(42),
        annual_contribution: 6_000.0,
        ..Default::default()
    }
}

fn create_params(model: SimulationModel) -> ModelParameters {
    match model {
        SimulationModel::DriftDiffusion => ModelParameters::Diffusion(vec![
            DiffusionParams {
                mu: 0.08,
                sigma: 0.16,
            },
            DiffusionParams {
                mu: 0.03,
                sigma: 0.05,
            },
        ]),
        SimulationModel::Resampling | SimulationModel::BlockResampling => {
            // Deterministic pseudo-returns, no RNG needed
            let pool = |phase: f64| {
                ReturnPool::new((0..756).map(|i| 0.01 * (i as f64 * 0.37 + phase).sin()).collect())
            };
            ModelParameters::Resampling(vec![pool(0.0), pool(1.3)])
        }
    }
}

fn bench_single_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_path_10yr");

    for model in SimulationModel::ALL {
        let config = create_config(model, 1);
        let generator = PathGenerator::new(&config, &[0.6, 0.4], create_params(model)).unwrap();
        let mut rng = ChaCha8Rng::from_seed([7; 32]);

        group.bench_function(model.as_str(), |b| {
            b.iter(|| generator.generate(black_box(&mut rng)))
        });
    }

    group.finish();
}

fn bench_worker_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("worker_pool");
    let pool = WorkerPool::available();

    for num_paths in [100, 1000, 5000].iter() {
        let config = create_config(SimulationModel::DriftDiffusion, *num_paths);
        let generator =
            PathGenerator::new(&config, &[0.6, 0.4], create_params(config.model)).unwrap();

        group.bench_with_input(BenchmarkId::new("paths", num_paths), num_paths, |b, &n| {
            b.iter(|| pool.run(n, black_box(42), None, |rng| generator.generate(rng)))
        });
    }

    group.finish();
}

fn bench_compute_stats(c: &mut Criterion) {
    let config = create_config(SimulationModel::DriftDiffusion, 5000);
    let generator = PathGenerator::new(&config, &[0.6, 0.4], create_params(config.model)).unwrap();
    let paths: Vec<SimulatedPath> = WorkerPool::available()
        .run(config.num_paths, 42, None, |rng| generator.generate(rng))
        .unwrap();

    c.bench_function("compute_stats_5000_paths", |b| {
        b.iter(|| {
            compute_stats(
                black_box(&paths),
                black_box(config.start_value),
                black_box(config.horizon_years()),
            )
        })
    });
}

criterion_group!(benches, bench_single_path, bench_worker_pool, bench_compute_stats);
criterion_main!(benches);
