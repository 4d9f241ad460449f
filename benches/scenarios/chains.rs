//! Ticking an engine busy with recurring chains.

use std::hint::black_box;

use criterion::{BatchSize, BenchmarkId, Criterion};
use livetime::{Count, Engine, EngineConfig, ManualClock};

fn engine() -> (Engine, ManualClock) {
    let wall = ManualClock::new();
    let mut engine = Engine::with_wall_clock(EngineConfig::default(), wall.clone())
        .expect("default config is valid");
    engine.start();
    (engine, wall)
}

/// One second of 1ms ticks with `chains` sixteenth-note repeats running
pub fn bench_chains(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/repeat");

    for chains in [1usize, 16, 128] {
        group.bench_with_input(BenchmarkId::new("one_second", chains), &chains, |b, &chains| {
            b.iter_batched(
                || {
                    let (mut engine, wall) = engine();
                    for i in 0..chains {
                        engine.at(i as f64 * 0.001);
                        engine.repeat(
                            0.0625,
                            |e: &mut Engine, step: u64| e.cc((step % 128) as u8, 64, None),
                            Count::Forever,
                        );
                    }
                    (engine, wall)
                },
                |(mut engine, wall)| {
                    for _ in 0..1000 {
                        wall.advance(0.001);
                        engine.tick();
                    }
                    black_box(engine.pending())
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

/// One second of ticks with `loops` live loops each playing a note per beat
pub fn bench_loops(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/live_loop");

    for loops in [1usize, 16, 64] {
        group.bench_with_input(BenchmarkId::new("one_second", loops), &loops, |b, &loops| {
            b.iter_batched(
                || {
                    let (mut engine, wall) = engine();
                    for i in 0..loops {
                        engine.live_loop(&format!("loop{i}"), |e: &mut Engine| {
                            e.note(60, 100, 0.1, None)?;
                            e.wait(0.25);
                            Ok::<_, livetime::SchedulerError>(())
                        });
                    }
                    (engine, wall)
                },
                |(mut engine, wall)| {
                    for _ in 0..1000 {
                        wall.advance(0.001);
                        engine.tick();
                    }
                    black_box(engine.pending())
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}
