//! Criterion benchmarks for u-moea.
//!
//! Measures the two hot kernels (non-dominated sorting, hypervolume) on
//! random point clouds, and a short end-to-end NSGA-II run on ZDT1.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use u_moea::algorithms::{Algorithm, AlgorithmConfig, AlgorithmKind};
use u_moea::dominance::{non_dominated_sort, ParetoDominance};
use u_moea::functions::Zdt;
use u_moea::indicators::hypervolume;
use u_moea::random::create_rng;
use u_moea::representation::Problem;

fn random_points(n: usize, m: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = create_rng(seed);
    (0..n)
        .map(|_| (0..m).map(|_| rng.random_range(0.0..1.0)).collect())
        .collect()
}

// ===========================================================================
// Non-dominated sorting
// ===========================================================================

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("non_dominated_sort");
    group.sample_size(10);

    for &n in &[100usize, 400] {
        let points = random_points(n, 3, 42);
        let relation = ParetoDominance::new(3);
        group.bench_with_input(BenchmarkId::from_parameter(n), &points, |b, p| {
            b.iter(|| non_dominated_sort(black_box(p), &relation).unwrap());
        });
    }
    group.finish();
}

// ===========================================================================
// Hypervolume
// ===========================================================================

fn bench_hypervolume(c: &mut Criterion) {
    let mut group = c.benchmark_group("hypervolume");
    group.sample_size(10);

    for &m in &[2usize, 3, 4] {
        let points = random_points(100, m, 7);
        let reference = vec![1.0; m];
        group.bench_with_input(BenchmarkId::from_parameter(m), &points, |b, p| {
            b.iter(|| hypervolume(black_box(p), Some(&reference)).unwrap());
        });
    }
    group.finish();
}

// ===========================================================================
// End-to-end
// ===========================================================================

fn bench_nsga2_zdt1(c: &mut Criterion) {
    let mut group = c.benchmark_group("nsga2_zdt1");
    group.sample_size(10);

    for &n in &[40usize, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let problem = Problem::builder()
                    .function(Zdt::zdt1(30).unwrap())
                    .build()
                    .unwrap();
                let config = AlgorithmConfig::default()
                    .with_population_size(n)
                    .with_max_generations(20)
                    .with_seed(42);
                Algorithm::new(AlgorithmKind::Nsga2, problem, config).run()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sort, bench_hypervolume, bench_nsga2_zdt1);
criterion_main!(benches);
