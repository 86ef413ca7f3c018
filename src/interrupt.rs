use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::Interrupted;

#[derive(Debug, Default)]
struct State {
    raised: Mutex<bool>,
    wake: Condvar,
}

/// Interruption status of one unit of work.
///
/// Clones share the status: the launcher hands one clone to the running unit
/// and returns another to whoever may want to interrupt it.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    state: Arc<State>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    fn raised(&self) -> MutexGuard<'_, bool> {
        self.state.raised.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Raises the status and wakes a sleeping unit.
    pub fn interrupt(&self) {
        *self.raised() = true;
        self.state.wake.notify_all();
    }

    pub fn is_interrupted(&self) -> bool {
        *self.raised()
    }

    /// Sleeps for `duration` unless the status is or becomes raised.
    ///
    /// An interrupted sleep returns `Err(Interrupted)` and clears the status;
    /// a caller that stops because of it should call [`interrupt`] again so
    /// the status outlives the sleep.
    ///
    /// [`interrupt`]: Interrupt::interrupt
    pub fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        // The status lock is released for the whole wait.
        let (mut raised, _) = self
            .state
            .wake
            .wait_timeout_while(self.raised(), duration, |raised| !*raised)
            .unwrap_or_else(PoisonError::into_inner);
        if *raised {
            *raised = false;
            Err(Interrupted)
        } else {
            Ok(())
        }
    }
}
