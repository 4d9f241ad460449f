//! Benchmarks for the scheduling engine.
//!
//! Run with: cargo bench
//!
//! A tick has to finish well inside the 1ms tick period, so these measure the
//! queue primitives and full drains with realistic amounts of pending work.
//!
//! Benchmark groups:
//!   - queue/*      Insertion and draining of the raw event queue
//!   - scenarios/*  Ticks of an engine running repeat chains and live loops

use criterion::{criterion_group, criterion_main};

mod engine;
mod scenarios;

/// Number of pending entries used by the queue benchmarks.
pub const QUEUE_SIZES: &[usize] = &[16, 256, 4096];

criterion_group!(
    benches,
    engine::bench_queue,
    scenarios::bench_chains,
    scenarios::bench_loops,
);
criterion_main!(benches);
