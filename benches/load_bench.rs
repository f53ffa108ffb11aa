use std::hint::black_box;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use envload::load::intensity::{Intensity, worker_count};
use envload::load::memory::{MemoryBudget, MemoryLoad};

const MB: u64 = 1024 * 1024;

fn bench_worker_count(c: &mut Criterion) {
    c.bench_function("worker_count_0_to_100", |b| {
        b.iter(|| {
            let mut total = 0usize;
            for value in 0..=100 {
                total += worker_count(Intensity::new(black_box(value)), black_box(64));
            }
            total
        });
    });
}

fn bench_memory_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_fill_16_64_256mb");
    group.sample_size(10);
    for size_mb in [16u64, 64, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(size_mb), &size_mb, |b, &size_mb| {
            b.iter(|| {
                let mut load = MemoryLoad::new(
                    MemoryBudget::from_bytes(size_mb * MB),
                    (4 * MB) as usize,
                    Duration::ZERO,
                );
                load.apply(Intensity::MAX);
                while load.is_filling() {
                    std::thread::yield_now();
                }
                let allocated = load.allocated_bytes();
                load.stop();
                black_box(allocated)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_worker_count, bench_memory_fill);
criterion_main!(benches);
