use tracing::{debug, trace, warn};

use super::Count;
use crate::engine::error::ActionOutcome;
use crate::engine::task::{LoopAction, LoopEntry, LoopStep, RepeatChain, Task};
use crate::Engine;

impl Engine {
    /// Call `action` every `interval` seconds, `count` times, starting at the
    /// cursor. The action receives the zero-based step index.
    ///
    /// Steps that already lie before `now()` are skipped and count
    /// against `count`, so a late call joins the chain where it would be had
    /// it started on time. A non-finite or non-positive interval is a no-op.
    /// The chain stops silently at the next step after an epoch bump.
    pub fn repeat<F, O>(&mut self, interval: f64, action: F, count: Count)
    where
        F: FnMut(&mut Engine, u64) -> O + 'static,
        O: ActionOutcome,
    {
        if !interval.is_finite() || interval <= 0.0 {
            debug!(interval, "repeat: invalid interval ignored");
            return;
        }

        let scope = *self.scopes.current();
        if !scope.cursor.is_finite() {
            debug!(cursor = scope.cursor, "repeat: non-finite start ignored");
            return;
        }

        // Catch up: skip the steps already behind `now()`
        let behind = self.now() - scope.cursor;
        let mut step = if behind > 0.0 { (behind / interval).ceil() as u64 } else { 0 };
        if scope.cursor + step as f64 * interval < self.now() {
            step += 1;
        }
        let remaining = match count {
            Count::Forever => Count::Forever,
            Count::Times(n) if n > step => Count::Times(n - step),
            Count::Times(_) => {
                trace!(step, "repeat: every step already in the past");
                return;
            }
        };

        let mut action = action;
        let chain = RepeatChain {
            origin: scope.cursor,
            interval,
            step,
            remaining,
            epoch: self.clock.epoch(),
            channel: scope.channel,
            action: Box::new(move |engine: &mut Engine, step: u64| action(engine, step).into_outcome()),
        };

        let first = chain.time_of(chain.step);
        if let Err(err) = self.schedule(first, Task::Repeat(chain)) {
            debug!(error = %err, "repeat: not scheduled");
        }
    }

    /// Start a named, self-rescheduling loop at the cursor, or swap the
    /// action of the loop already running under `name`.
    ///
    /// Each iteration runs with the cursor at the iteration's time; the loop
    /// continues at wherever the action leaves the cursor. An iteration that
    /// does not move the cursor strictly forward ends the loop. Swapping keeps
    /// the running chain, so the new action picks up on the next iteration
    /// without losing phase.
    ///
    /// A new loop starts at the cursor even when that lies behind `now()`:
    /// the iterations already due run on the next tick, back to back, until
    /// the loop catches up. After a reload, a loop keeps going only if the new
    /// script calls `live_loop` for it again. An empty name makes the call a
    /// no-op.
    pub fn live_loop<F, O>(&mut self, name: &str, action: F)
    where
        F: FnMut(&mut Engine) -> O + 'static,
        O: ActionOutcome,
    {
        if name.is_empty() {
            debug!("live_loop: empty name ignored");
            return;
        }

        let mut action = action;
        let boxed: LoopAction = Box::new(move |engine: &mut Engine| action(engine).into_outcome());
        let epoch = self.clock.epoch();

        if let Some(entry) = self.loops.get_mut(name) {
            if entry.active {
                debug!(name, "live_loop: action swapped");
                entry.action = Some(boxed);
                entry.epoch = epoch;
                return;
            }
        }

        let scope = *self.scopes.current();
        let chain = self.loops.next_chain();
        let step = LoopStep {
            name: name.to_string(),
            chain,
            channel: scope.channel,
        };

        match self.schedule(scope.cursor, Task::Loop(step)) {
            Ok(_) => {
                debug!(name, at = scope.cursor, "live_loop: started");
                self.loops.insert(
                    name,
                    LoopEntry {
                        action: Some(boxed),
                        active: true,
                        epoch,
                        chain,
                    },
                );
            }
            Err(err) => warn!(name, error = %err, "live_loop: not started"),
        }
    }

    /// Stop the loop running under `name`. Returns whether one was running.
    pub fn stop_loop(&mut self, name: &str) -> bool {
        match self.loops.get_mut(name) {
            Some(entry) if entry.active => {
                entry.active = false;
                true
            }
            _ => false,
        }
    }

    pub fn is_loop_active(&self, name: &str) -> bool {
        self.loops.get(name).is_some_and(|entry| entry.active)
    }

    /// Names of the running loops, sorted
    pub fn active_loops(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loops.active_names().map(str::to_string).collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::engine::clock::ManualClock;
    use crate::EngineConfig;

    fn engine() -> (Engine, ManualClock) {
        let wall = ManualClock::new();
        let mut engine = Engine::with_wall_clock(EngineConfig::default(), wall.clone()).unwrap();
        engine.start();
        (engine, wall)
    }

    /// Advance wall time in 1ms ticks, like the periodic driver would
    fn run_for(engine: &mut Engine, wall: &ManualClock, seconds: f64) {
        let ticks = (seconds * 1000.0).round() as u64;
        for _ in 0..ticks {
            wall.advance(0.001);
            engine.tick();
        }
    }

    fn recorder() -> (Rc<RefCell<Vec<u64>>>, impl FnMut(&mut Engine, u64) + 'static) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let c = calls.clone();
        (calls, move |_: &mut Engine, step: u64| c.borrow_mut().push(step))
    }

    #[test]
    fn test_repeat_calls_count_times() {
        let (mut engine, wall) = engine();
        let (calls, action) = recorder();

        engine.repeat(1.0, action, Count::Times(5));

        wall.advance(2.0);
        engine.tick();
        assert_eq!(*calls.borrow(), vec![0, 1, 2]);

        wall.advance(4.0);
        engine.tick();
        assert_eq!(*calls.borrow(), vec![0, 1, 2, 3, 4]);
        assert_eq!(engine.pending(), 0);
    }

    #[test]
    fn test_repeat_steps_fire_at_their_own_time() {
        let (mut engine, wall) = engine();
        let times = Rc::new(RefCell::new(Vec::new()));
        let t = times.clone();

        engine.repeat(
            1.0,
            move |e: &mut Engine, _| t.borrow_mut().push((e.now(), e.cursor())),
            Count::Times(3),
        );
        run_for(&mut engine, &wall, 3.0);

        assert_eq!(*times.borrow(), vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
    }

    #[test]
    fn test_repeat_skips_past_steps() {
        let (mut engine, wall) = engine();
        let (calls, action) = recorder();

        wall.advance(2.0);
        engine.tick();
        engine.repeat(1.0, action, Count::Times(5));

        wall.advance(6.0);
        engine.tick();
        assert_eq!(*calls.borrow(), vec![2, 3, 4]);
    }

    #[test]
    fn test_repeat_skips_all_steps() {
        let (mut engine, wall) = engine();
        let (calls, action) = recorder();

        wall.advance(10.0);
        engine.tick();
        engine.repeat(1.0, action, Count::Times(5));
        assert_eq!(engine.pending(), 0);

        wall.advance(6.0);
        engine.tick();
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_repeat_ignores_invalid_intervals() {
        let (mut engine, wall) = engine();

        for interval in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let (calls, action) = recorder();
            engine.repeat(interval, action, Count::Times(5));
            wall.advance(5.0);
            engine.tick();
            assert!(calls.borrow().is_empty());
        }
    }

    #[test]
    fn test_repeat_forever() {
        let (mut engine, wall) = engine();
        let (calls, action) = recorder();

        engine.repeat(1.0, action, Count::Forever);
        wall.advance(6.0);
        engine.tick();

        assert_eq!(calls.borrow().len(), 7);
        assert_eq!(engine.pending(), 1);
    }

    #[test]
    fn test_repeat_stops_after_epoch_bump() {
        let (mut engine, wall) = engine();
        let (calls, action) = recorder();

        engine.repeat(1.0, action, Count::Forever);
        wall.advance(1.0);
        engine.tick();
        assert_eq!(calls.borrow().len(), 2);

        engine.bump_epoch();
        wall.advance(5.0);
        engine.tick();
        assert_eq!(calls.borrow().len(), 2);
        assert_eq!(engine.pending(), 0);
    }

    #[test]
    fn test_repeat_uses_scope_channel() {
        let (mut engine, wall) = engine();
        let channels = Rc::new(RefCell::new(Vec::new()));
        let c = channels.clone();

        engine.channel(4);
        engine.repeat(
            0.5,
            move |e: &mut Engine, _| c.borrow_mut().push(e.current_channel()),
            Count::Times(2),
        );
        engine.channel(0);

        wall.advance(1.0);
        engine.tick();
        assert_eq!(*channels.borrow(), vec![4, 4]);
    }

    #[test]
    fn test_repeat_errors_do_not_break_the_chain() {
        let (mut engine, wall) = engine();

        engine.repeat(
            1.0,
            |_: &mut Engine, step: u64| {
                if step == 1 {
                    Err(format!("step {step} failed"))
                } else {
                    Ok(())
                }
            },
            Count::Times(3),
        );
        wall.advance(3.0);
        engine.tick();

        assert_eq!(engine.output().lines().collect::<Vec<_>>(), vec!["error: step 1 failed"]);
        assert_eq!(engine.pending(), 0);
    }

    #[test]
    fn test_repeat_reset_from_its_own_step_ends_the_chain() {
        let (mut engine, wall) = engine();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let c = calls.clone();

        engine.repeat(
            1.0,
            move |e: &mut Engine, step: u64| {
                c.borrow_mut().push(step);
                if step == 1 {
                    e.reset();
                }
            },
            Count::Forever,
        );
        run_for(&mut engine, &wall, 1.5);
        assert_eq!(*calls.borrow(), vec![0, 1]);
        assert_eq!(engine.pending(), 0);

        engine.start();
        run_for(&mut engine, &wall, 3.0);
        assert_eq!(*calls.borrow(), vec![0, 1]);
    }

    fn counter() -> (Rc<RefCell<Vec<f64>>>, impl FnMut(&mut Engine) + 'static) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let c = calls.clone();
        (calls, move |e: &mut Engine| {
            c.borrow_mut().push(e.now());
            e.wait(1.0);
        })
    }

    #[test]
    fn test_loop_runs_once_per_interval() {
        let (mut engine, wall) = engine();
        let (calls, action) = counter();

        engine.live_loop("x", action);
        assert!(engine.is_loop_active("x"));

        run_for(&mut engine, &wall, 3.5);
        assert_eq!(*calls.borrow(), vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_loop_hot_swap_keeps_phase() {
        let (mut engine, wall) = engine();
        let (a_calls, a) = counter();
        let (b_calls, b) = counter();

        engine.live_loop("x", a);
        run_for(&mut engine, &wall, 1.5);
        assert_eq!(*a_calls.borrow(), vec![0.0, 1.0]);

        engine.live_loop("x", b);
        run_for(&mut engine, &wall, 2.0);

        assert_eq!(*a_calls.borrow(), vec![0.0, 1.0]);
        assert_eq!(*b_calls.borrow(), vec![2.0, 3.0]);
        assert_eq!(engine.active_loops(), vec!["x".to_string()]);
    }

    #[test]
    fn test_loop_without_wait_fires_once() {
        let (mut engine, wall) = engine();
        let calls = Rc::new(RefCell::new(0));
        let c = calls.clone();

        engine.live_loop("still", move |_: &mut Engine| *c.borrow_mut() += 1);
        run_for(&mut engine, &wall, 2.0);

        assert_eq!(*calls.borrow(), 1);
        assert!(!engine.is_loop_active("still"));
        assert_eq!(engine.pending(), 0);
    }

    #[test]
    fn test_loop_swapped_from_inside_itself() {
        let (mut engine, wall) = engine();
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();

        engine.live_loop("self", move |e: &mut Engine| {
            l.borrow_mut().push("first");
            let l = l.clone();
            e.live_loop("self", move |e: &mut Engine| {
                l.borrow_mut().push("second");
                e.wait(1.0);
            });
            e.wait(1.0);
        });
        run_for(&mut engine, &wall, 2.5);

        assert_eq!(*log.borrow(), vec!["first", "second", "second"]);
    }

    #[test]
    fn test_loop_ignores_empty_name() {
        let (mut engine, _) = engine();
        let (calls, action) = counter();

        engine.live_loop("", action);
        assert_eq!(engine.pending(), 0);
        assert!(engine.active_loops().is_empty());
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_loop_started_behind_now_catches_up() {
        let (mut engine, wall) = engine();
        let (calls, action) = counter();

        wall.advance(5.0);
        engine.tick();
        engine.at(1.0);
        engine.live_loop("late", action);
        assert!(engine.is_loop_active("late"));
        assert_eq!(engine.pending(), 1);

        wall.advance(0.001);
        engine.tick();
        assert_eq!(*calls.borrow(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(engine.next_due(), Some(6.0));
    }

    #[test]
    fn test_loop_reset_from_its_own_step_ends_the_loop() {
        let (mut engine, wall) = engine();
        let calls = Rc::new(RefCell::new(0));
        let c = calls.clone();

        engine.live_loop("x", move |e: &mut Engine| {
            *c.borrow_mut() += 1;
            if *c.borrow() == 2 {
                e.reset();
            } else {
                e.wait(1.0);
            }
        });
        run_for(&mut engine, &wall, 1.5);
        assert_eq!(*calls.borrow(), 2);
        assert_eq!(engine.pending(), 0);
        assert!(engine.active_loops().is_empty());
    }

    #[test]
    fn test_stop_loop_then_restart() {
        let (mut engine, wall) = engine();
        let (a_calls, a) = counter();
        let (b_calls, b) = counter();

        engine.live_loop("x", a);
        run_for(&mut engine, &wall, 0.5);
        assert!(engine.stop_loop("x"));
        assert!(!engine.stop_loop("x"));

        // A new chain starts; the stopped chain's queued step must not run
        engine.next(1.0);
        engine.live_loop("x", b);
        run_for(&mut engine, &wall, 2.0);

        assert_eq!(*a_calls.borrow(), vec![0.0]);
        assert_eq!(*b_calls.borrow(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_loop_survives_reload_only_when_registered_again() {
        let (mut engine, wall) = engine();
        let (kept_calls, kept) = counter();
        let (dropped_calls, dropped) = counter();
        let (swapped_calls, swapped) = counter();

        engine.run_script(move |e: &mut Engine| {
            e.live_loop("kept", kept);
            e.live_loop("dropped", dropped);
        });
        run_for(&mut engine, &wall, 1.5);

        engine.reload(move |e: &mut Engine| e.live_loop("kept", swapped));
        run_for(&mut engine, &wall, 1.0);

        assert_eq!(*kept_calls.borrow(), vec![0.0, 1.0]);
        assert_eq!(*swapped_calls.borrow(), vec![2.0]);
        assert_eq!(*dropped_calls.borrow(), vec![0.0, 1.0]);
        assert!(engine.is_loop_active("kept"));
        assert!(!engine.is_loop_active("dropped"));
    }
}
