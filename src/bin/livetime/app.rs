//! Live - application builder and runner
//!
//! The engine runs on its own thread and talks to the UI through lock-free
//! ring buffers: control messages in, transport snapshots, log lines and MIDI
//! out.

use std::thread;
use std::time::{Duration, Instant};

use color_eyre::config::PanicHook;
use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{info, trace, warn};

use livetime::io::TimedMidi;
use livetime::{Engine, EngineConfig, SchedulerError};

use super::hooks::{self, ENGINE_THREAD};
use super::ui::state::{ControlMessage, UiStateUpdate};
use super::ui::UiApp;

/// A script: run once at startup and again on every reload
pub type Script = fn(&mut Engine) -> Result<(), SchedulerError>;

/// Beats per minute added or removed by one speed key press
const BPM_STEP: f64 = 5.0;
/// Minimum time between two transport snapshots (~60fps)
const PUBLISH_PERIOD: Duration = Duration::from_millis(16);

/// Main application builder
pub struct Live {
    bpm: f64,
    config: EngineConfig,
    script: Script,
    panic_hook: Option<PanicHook>,
}

impl Live {
    pub fn new() -> Self {
        Self {
            bpm: 60.0,
            config: EngineConfig::default(),
            script: |_| Ok(()),
            panic_hook: None,
        }
    }

    /// Set the tempo. One beat lasts one virtual second at 60 BPM.
    pub fn bpm(mut self, bpm: f64) -> Self {
        self.bpm = bpm;
        self
    }

    pub fn tick_period(mut self, period: Duration) -> Self {
        self.config = self.config.with_tick_period(period);
        self
    }

    pub fn script(mut self, script: Script) -> Self {
        self.script = script;
        self
    }

    /// Report panics through `hook` once the terminal is taken over
    pub fn panic_hook(mut self, hook: PanicHook) -> Self {
        self.panic_hook = Some(hook);
        self
    }

    /// Run until the user quits (takes over the terminal)
    pub fn run(self) -> EyreResult<()> {
        let (control_tx, control_rx) = RingBuffer::<ControlMessage>::new(64);
        let (state_tx, state_rx) = RingBuffer::<UiStateUpdate>::new(64);
        let (log_tx, log_rx) = RingBuffer::<String>::new(1024);
        let (midi_tx, midi_rx) = RingBuffer::<TimedMidi>::new(4096);

        let config = self.config.with_initial_speed(self.bpm / 60.0);
        let script = self.script;

        let mut terminal = ratatui::init();
        if let Some(hook) = self.panic_hook {
            hooks::install_panic_hook(hook);
        }

        info!(bpm = self.bpm, "starting engine thread");
        let spawned = thread::Builder::new()
            .name(ENGINE_THREAD.into())
            .spawn(move || {
                let engine = Engine::new(config)?.with_midi_output(midi_tx);
                EngineThread::new(script, control_rx, state_tx, log_tx).run(engine);
                Ok::<_, SchedulerError>(())
            });
        let engine_thread = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                ratatui::restore();
                return Err(err).wrap_err("failed to spawn engine thread");
            }
        };

        let mut app = UiApp::new(control_tx, state_rx, log_rx, midi_rx);
        let result = app.run(&mut terminal);
        ratatui::restore();

        // Make sure the engine stops even when the UI bailed out with an error
        app.quit();
        engine_thread
            .join()
            .map_err(|_| eyre!("engine thread panicked"))?
            .wrap_err("engine failed to start")?;

        result
    }
}

impl Default for Live {
    fn default() -> Self {
        Self::new()
    }
}

/// Engine-side end of the ring buffers
struct EngineThread {
    script: Script,
    control_rx: Consumer<ControlMessage>,
    state_tx: Producer<UiStateUpdate>,
    log_tx: Producer<String>,
    log_seen: u64,
    last_publish: Option<Instant>,
}

impl EngineThread {
    fn new(
        script: Script,
        control_rx: Consumer<ControlMessage>,
        state_tx: Producer<UiStateUpdate>,
        log_tx: Producer<String>,
    ) -> Self {
        Self {
            script,
            control_rx,
            state_tx,
            log_tx,
            log_seen: 0,
            last_publish: None,
        }
    }

    fn run(mut self, mut engine: Engine) {
        engine.run_script(self.script);
        engine.run_until(|engine| self.poll(engine));
        info!(now = engine.now(), "engine thread stopped");
    }

    /// Handle pending control messages and publish state.
    /// Returns true once the UI asked to quit.
    fn poll(&mut self, engine: &mut Engine) -> bool {
        while let Ok(message) = self.control_rx.pop() {
            match message {
                ControlMessage::TogglePause => engine.toggle_pause(),
                ControlMessage::Reload => engine.reload(self.script),
                ControlMessage::SpeedUp => self.nudge_speed(engine, BPM_STEP),
                ControlMessage::SpeedDown => self.nudge_speed(engine, -BPM_STEP),
                ControlMessage::Quit => return true,
            }
        }

        self.forward_log(engine);
        if self.last_publish.map_or(true, |at| at.elapsed() >= PUBLISH_PERIOD) {
            self.publish(engine);
            self.last_publish = Some(Instant::now());
        }
        false
    }

    fn nudge_speed(&self, engine: &mut Engine, bpm_delta: f64) {
        let speed = engine.get_speed() + bpm_delta / 60.0;
        if let Err(err) = engine.set_speed(speed) {
            warn!(error = %err, "speed change rejected");
        }
    }

    /// Forward new output lines. Lines that do not fit stay unseen and go
    /// out on a later poll, unless the engine log drops them first.
    fn forward_log(&mut self, engine: &Engine) {
        let output = engine.output();
        let unseen = output.written() - self.log_seen;
        let evicted = unseen - output.since(self.log_seen).count() as u64;
        if evicted > 0 {
            warn!(dropped = evicted, "output lines dropped before reaching the UI");
            self.log_seen += evicted;
        }

        for line in output.since(self.log_seen) {
            if self.log_tx.push(line.to_string()).is_err() {
                trace!(backlog = output.written() - self.log_seen, "log buffer full");
                break;
            }
            self.log_seen += 1;
        }
    }

    fn publish(&mut self, engine: &Engine) {
        let update = UiStateUpdate {
            now: engine.now(),
            speed: engine.get_speed(),
            paused: engine.is_paused(),
            epoch: engine.epoch(),
            pending: engine.pending(),
            loops: engine.active_loops().len(),
        };
        // A full buffer means the UI is behind; the next snapshot supersedes this one
        if self.state_tx.push(update).is_err() {
            trace!(now = update.now, "state buffer full, snapshot skipped");
        }
    }
}
