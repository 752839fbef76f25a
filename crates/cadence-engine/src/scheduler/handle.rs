use std::fmt;
use std::sync::Weak;

use crate::signal::RegistrationError;

/// Type-erased control surface shared by every scheduler instantiation.
pub(super) trait Control: Send + Sync {
    fn start(&self) -> Result<(), RegistrationError>;
    fn stop(&self);
    fn is_running(&self) -> bool;
}

/// Weak control handle to a [`FrameScheduler`](super::FrameScheduler).
///
/// Hand this to the consumer when it needs to stop the loop from inside its
/// own tick; it does not keep the scheduler alive.
#[derive(Clone)]
pub struct SchedulerHandle {
    control: Weak<dyn Control>,
}

impl SchedulerHandle {
    pub(super) fn new(control: Weak<dyn Control>) -> Self {
        Self { control }
    }

    /// Starts the loop; fails with `Shutdown` once the scheduler is gone.
    pub fn start(&self) -> Result<(), RegistrationError> {
        match self.control.upgrade() {
            Some(control) => control.start(),
            None => Err(RegistrationError::Shutdown),
        }
    }

    /// Stops the loop. No-op once the scheduler is gone.
    pub fn stop(&self) {
        if let Some(control) = self.control.upgrade() {
            control.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.control
            .upgrade()
            .is_some_and(|control| control.is_running())
    }
}

impl fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("alive", &(self.control.strong_count() > 0))
            .field("running", &self.is_running())
            .finish()
    }
}
