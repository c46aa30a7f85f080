//! Basic benchmarks for the `manual_vec` crate.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::iter;
use std::time::Instant;

use alloc_tracker::Allocator;
use criterion::{Criterion, criterion_group, criterion_main};
use manual_vec::{CloneElements, ManualVec};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

#[global_allocator]
static ALLOCATOR: Allocator<std::alloc::System> = Allocator::system();

type TestItem = usize;
const TEST_VALUE: TestItem = 1024;

const FILL_COUNT: usize = 1000;

fn entrypoint(c: &mut Criterion) {
    let allocs = alloc_tracker::Session::new();

    let mut group = c.benchmark_group("manual_vec_basic");

    let allocs_op = allocs.operation("build_empty");
    group.bench_function("build_empty", |b| {
        b.iter_custom(|iters| {
            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                drop(black_box(ManualVec::<TestItem>::new()));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("push_one_within_capacity");
    group.bench_function("push_one_within_capacity", |b| {
        b.iter_custom(|iters| {
            let mut vecs = iter::repeat_with(|| ManualVec::<TestItem>::with_capacity(1))
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for vec in &mut vecs {
                vec.push(black_box(TEST_VALUE));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("push_fill_from_empty");
    group.bench_function("push_fill_from_empty", |b| {
        b.iter_custom(|iters| {
            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                let mut vec = ManualVec::<TestItem>::new();

                for _ in 0..FILL_COUNT {
                    vec.push(black_box(TEST_VALUE));
                }

                drop(black_box(vec));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("push_fill_reserved");
    group.bench_function("push_fill_reserved", |b| {
        b.iter_custom(|iters| {
            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                let mut vec = ManualVec::<TestItem>::new();
                vec.reserve(FILL_COUNT);

                for _ in 0..FILL_COUNT {
                    vec.push(black_box(TEST_VALUE));
                }

                drop(black_box(vec));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("insert_front_reallocating_move");
    group.bench_function("insert_front_reallocating_move", |b| {
        b.iter_custom(|iters| {
            let mut vecs = iter::repeat_with(|| {
                let mut vec = ManualVec::<String>::with_capacity(FILL_COUNT);
                vec.resize_with(FILL_COUNT, || TEST_VALUE.to_string());
                vec
            })
            .take(usize::try_from(iters).unwrap())
            .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for vec in &mut vecs {
                vec.insert(0, black_box(String::new()));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("insert_front_reallocating_clone");
    group.bench_function("insert_front_reallocating_clone", |b| {
        b.iter_custom(|iters| {
            let mut vecs = iter::repeat_with(|| {
                let mut vec: ManualVec<String, CloneElements> = ManualVec::builder()
                    .clone_on_transfer()
                    .capacity(FILL_COUNT)
                    .build();
                vec.resize_with(FILL_COUNT, || TEST_VALUE.to_string());
                vec
            })
            .take(usize::try_from(iters).unwrap())
            .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for vec in &mut vecs {
                vec.insert(0, black_box(String::new()));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("remove_front");
    group.bench_function("remove_front", |b| {
        b.iter_custom(|iters| {
            let mut vecs = iter::repeat_with(|| ManualVec::<TestItem>::with_len(FILL_COUNT))
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for vec in &mut vecs {
                _ = black_box(vec.remove(0));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("clone_full");
    group.bench_function("clone_full", |b| {
        b.iter_custom(|iters| {
            let source = ManualVec::<TestItem>::with_len(FILL_COUNT);

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                drop(black_box(source.clone()));
            }

            start.elapsed()
        });
    });

    group.finish();

    allocs.print_to_stdout();
}
