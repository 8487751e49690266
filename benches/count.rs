use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use short_cycles::{incidence, CycleCounter, DenseMatrixRef, FromRng, Parallel, ProductStrategy, Serial};

/// A random check matrix with roughly `row_weight` ones per row.
fn tanner<S: ProductStrategy>(rows: usize, cols: usize, row_weight: usize) -> DenseMatrixRef<S> {
    let mut rng = StdRng::from_seed([7; 32]);
    let density = row_weight as f32 / cols as f32;
    DenseMatrixRef::with_density(&mut rng, &[rows, cols], density)
}

fn count_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("count_tanner");
    group.sample_size(20);

    for &(rows, cols) in &[(32, 64), (64, 128), (128, 256)] {
        let serial = CycleCounter::new(tanner::<Serial>(rows, cols, 6)).unwrap();
        let parallel = CycleCounter::new(tanner::<Parallel>(rows, cols, 6)).unwrap();
        let id = format!("{rows}x{cols}");

        group.bench_with_input(BenchmarkId::new("serial", &id), &serial, |b, counter| {
            b.iter(|| black_box(counter.count().unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("parallel", &id), &parallel, |b, counter| {
            b.iter(|| black_box(counter.count().unwrap()))
        });
    }
    group.finish();
}

fn long_cycle_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("count_long_cycle");
    group.sample_size(10);

    // girth equals the longest possible cycle, so the search runs to the end
    for &k in &[16, 32] {
        let counter = CycleCounter::new(incidence::cycle::<Serial>(k).unwrap()).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(2 * k), &counter, |b, counter| {
            b.iter(|| black_box(counter.count().unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, count_benchmark, long_cycle_benchmark);
criterion_main!(benches);
