//! Error types for the scheduling engine.
//!
//! Two kinds of failure exist and they are handled differently:
//!
//! - `SchedulerError` is API misuse (a non-finite time, a non-positive speed,
//!   a bad configuration).
//!   It is returned synchronously to the caller.
//! - `ActionError` is a failure *inside* a scheduled action. It never reaches
//!   the code that scheduled the action: the engine catches it while draining
//!   and writes it to the output log, then keeps going.

use std::any::Any;
use std::fmt;

use thiserror::Error;

/// Misuse of the scheduling API.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulerError {
    /// A queue entry was given a time that is NaN or infinite
    #[error("expected a finite time but got {time}")]
    InvalidTime { time: f64 },
    /// Speed must be finite and strictly positive
    #[error("speed should be a positive number, got {speed}")]
    InvalidSpeed { speed: f64 },
    /// MIDI channels are numbered 0 to 15
    #[error("midi channel out of range: {channel}")]
    InvalidChannel { channel: u8 },
}

/// Failure raised by a user action while the engine drains the queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ActionError {
    message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Build an error from a caught panic payload
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };

        Self {
            message: format!("panicked: {message}"),
        }
    }
}

impl From<SchedulerError> for ActionError {
    fn from(err: SchedulerError) -> Self {
        Self::new(err.to_string())
    }
}

/// What an action may return.
///
/// Lets scripts write plain closures (`|e| e.wait(1.0)`) as well as fallible
/// ones (`|e| { e.fire(..)?; Ok(()) }`).
pub trait ActionOutcome {
    fn into_outcome(self) -> Result<(), ActionError>;
}

impl ActionOutcome for () {
    fn into_outcome(self) -> Result<(), ActionError> {
        Ok(())
    }
}

impl<E: fmt::Display> ActionOutcome for Result<(), E> {
    fn into_outcome(self) -> Result<(), ActionError> {
        self.map_err(|e| ActionError::new(e.to_string()))
    }
}
