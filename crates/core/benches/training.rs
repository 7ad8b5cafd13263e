//! Training-throughput benchmarks for the two solver backends.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use leduc_solver_core::cfr::{MccfrConfig, MccfrSolver, VanillaCfr};
use leduc_solver_core::game::{KuhnPoker, LeducPoker};

fn bench_vanilla_kuhn(c: &mut Criterion) {
    let mut group = c.benchmark_group("vanilla_kuhn");

    for &iters in &[100u64, 1_000] {
        group.bench_with_input(BenchmarkId::new("train", iters), &iters, |b, &iters| {
            b.iter(|| {
                let mut solver = VanillaCfr::with_seed(KuhnPoker::new(), 42);
                solver.train(iters);
                solver.nodes().node_count() // prevent dead-code elimination
            });
        });
    }

    group.finish();
}

fn bench_mccfr_leduc(c: &mut Criterion) {
    let mut group = c.benchmark_group("mccfr_leduc");

    for &iters in &[100u64, 1_000] {
        group.bench_with_input(BenchmarkId::new("train", iters), &iters, |b, &iters| {
            b.iter(|| {
                let mut solver =
                    MccfrSolver::with_seed(LeducPoker::headsup(), MccfrConfig::default(), 42);
                solver.train(iters);
                solver.nodes().node_count()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_vanilla_kuhn, bench_mccfr_leduc);
criterion_main!(benches);
