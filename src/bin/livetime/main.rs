//! livetime - live-coded MIDI scheduling in the terminal
//!
//! Run with: cargo run
//!
//! Set `LIVETIME_LOG=livetime.log` to write engine traces to a file
//! (filtered by `RUST_LOG`, e.g. `RUST_LOG=livetime=debug`).

mod app;
mod demo;
mod hooks;
mod ui;

use std::fs::File;
use std::sync::Mutex;

use app::Live;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tracing_subscriber::EnvFilter;

fn main() -> EyreResult<()> {
    let panic_hook = hooks::install_eyre()?;
    init_tracing()?;

    Live::new()
        .bpm(120.0)
        .script(demo::script)
        .panic_hook(panic_hook)
        .run()
}

/// The terminal belongs to the UI, so traces only go to a file
fn init_tracing() -> EyreResult<()> {
    let Ok(path) = std::env::var("LIVETIME_LOG") else {
        return Ok(());
    };

    let file = File::create(&path).wrap_err_with(|| format!("failed to create log file {path}"))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
