//! Benchmarks for submit/drain throughput.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use taskwell::Pool;

fn bench_submit_join(c: &mut Criterion) {
    let pool = Pool::new_with(4, 0).unwrap();

    c.bench_function("submit_join_1000", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..1_000)
                .map(|i| pool.submit(move || black_box(i * i)).unwrap())
                .collect();
            for handle in &handles {
                handle.get().unwrap();
            }
        });
    });
}

fn bench_bounded_submit_join(c: &mut Criterion) {
    let pool = Pool::new_with(4, 256).unwrap();

    c.bench_function("bounded_submit_join_1000", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..1_000)
                .map(|i| pool.submit(move || black_box(i + 1)).unwrap())
                .collect();
            for handle in &handles {
                handle.get().unwrap();
            }
        });
    });
}

criterion_group!(benches, bench_submit_join, bench_bounded_submit_join);
criterion_main!(benches);
