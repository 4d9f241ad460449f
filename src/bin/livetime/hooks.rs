//! Error and panic reporting while the TUI owns the terminal
//!
//! Panics inside scheduled actions are caught by the engine, but the panic
//! hook still runs first. Printing to stderr there would tear through the
//! alternate screen, so engine-thread panics go to tracing instead.

use std::panic;
use std::thread;

use color_eyre::config::{HookBuilder, PanicHook};
use color_eyre::eyre::Result as EyreResult;
use tracing::error;

/// Name of the thread that drives the engine
pub const ENGINE_THREAD: &str = "engine";

/// Install the eyre report hook and hand back the panic hook.
///
/// The panic hook is installed later by [`install_panic_hook`], after the
/// terminal has been set up.
pub fn install_eyre() -> EyreResult<PanicHook> {
    let (panic_hook, eyre_hook) = HookBuilder::default().into_hooks();
    eyre_hook.install()?;
    Ok(panic_hook)
}

/// Route panics on the engine thread to tracing; anywhere else restore the
/// terminal before printing the report.
///
/// Must run after `ratatui::init`, which installs a hook of its own.
pub fn install_panic_hook(panic_hook: PanicHook) {
    panic::set_hook(Box::new(move |info| {
        if is_engine_thread(thread::current().name()) {
            error!("{}", panic_hook.panic_report(info));
            return;
        }
        ratatui::restore();
        eprintln!("{}", panic_hook.panic_report(info));
    }));
}

fn is_engine_thread(name: Option<&str>) -> bool {
    name == Some(ENGINE_THREAD)
}
