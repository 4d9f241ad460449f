//! Benchmarks for whole-engine ticks.

mod chains;

pub use chains::{bench_chains, bench_loops};
