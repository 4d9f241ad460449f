use tracing::trace;

use crate::engine::error::{ActionOutcome, SchedulerError};
use crate::engine::task::Task;
use crate::Engine;

impl Engine {
    /// Schedule `action` at the cursor.
    ///
    /// The action runs with the cursor and channel as they are now, whatever
    /// the calling code does afterwards. A cursor already behind `now()` makes
    /// this a silent no-op; a non-finite cursor is an error.
    ///
    /// One-shot actions survive script reloads: only recurring chains are
    /// cut off by the epoch.
    pub fn fire<F, O>(&mut self, action: F) -> Result<(), SchedulerError>
    where
        F: FnOnce(&mut Engine) -> O + 'static,
        O: ActionOutcome,
    {
        let scope = *self.scopes.current();

        if !(scope.cursor >= self.now()) {
            trace!(cursor = scope.cursor, now = self.now(), "fire in the past ignored");
            return Ok(());
        }

        self.schedule(
            scope.cursor,
            Task::Fire {
                scope,
                action: Box::new(move |engine: &mut Engine| action(engine).into_outcome()),
            },
        )?;

        Ok(())
    }
}
