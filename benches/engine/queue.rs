//! Benchmarks for the time-ordered event queue.

use std::hint::black_box;

use criterion::{BatchSize, BenchmarkId, Criterion};
use livetime::engine::queue::EventQueue;

use crate::QUEUE_SIZES;

/// Times spread over ten seconds, out of order, with plenty of ties
fn times(count: usize) -> Vec<f64> {
    (0..count).map(|i| ((i * 7919) % 1000) as f64 / 100.0).collect()
}

pub fn bench_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue");

    for &size in QUEUE_SIZES {
        let times = times(size);

        group.bench_with_input(BenchmarkId::new("add", size), &times, |b, times| {
            b.iter(|| {
                let mut queue = EventQueue::new();
                for &time in times {
                    let _ = queue.add(black_box(time), 0, ());
                }
                queue
            })
        });

        // Drain everything in one tick
        group.bench_with_input(BenchmarkId::new("drain", size), &times, |b, times| {
            b.iter_batched(
                || {
                    let mut queue = EventQueue::new();
                    for &time in times {
                        let _ = queue.add(time, 0, ());
                    }
                    queue
                },
                |mut queue| {
                    while let Some(entry) = queue.pop_ready(black_box(10.0)) {
                        black_box(entry.time);
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}
