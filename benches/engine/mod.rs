//! Benchmarks for low-level engine primitives.

mod queue;

pub use queue::bench_queue;
