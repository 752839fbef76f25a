use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{RefreshCallback, RefreshSignalSource, RegistrationError};
use crate::time::MonotonicTime;

#[derive(Default)]
struct ManualState {
    pending: Vec<RefreshCallback>,
    registrations: usize,
    cancellations: usize,
    failures: usize,
    unavailable: bool,
}

/// Refresh source fired by hand.
///
/// Every call is counted so tests can assert on registration traffic. The
/// thread that calls `fire` acts as the delivery context.
#[derive(Default)]
pub struct ManualRefreshSource {
    state: Mutex<ManualState>,
}

impl ManualRefreshSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Delivers `timestamp` to every registration pending at call time.
    ///
    /// Registrations made during delivery wait for the next `fire`. Returns
    /// the number of callbacks run.
    pub fn fire(&self, timestamp: MonotonicTime) -> usize {
        let callbacks = mem::take(&mut self.state().pending);
        let delivered = callbacks.len();

        for callback in callbacks {
            if let Err(e) = callback(timestamp) {
                log::error!("refresh callback failed at {timestamp}: {e:#}");
                self.state().failures += 1;
            }
        }

        delivered
    }

    /// Removes pending callbacks without running them.
    ///
    /// Lets a test hold a signal that has already fired while the scheduler
    /// is stopped underneath it.
    pub fn take_pending(&self) -> Vec<RefreshCallback> {
        mem::take(&mut self.state().pending)
    }

    /// Makes subsequent registrations fail with `RegistrationError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// Number of registrations currently waiting for a signal.
    pub fn pending(&self) -> usize {
        self.state().pending.len()
    }

    /// Total successful `register_once` calls.
    pub fn registrations(&self) -> usize {
        self.state().registrations
    }

    /// Total `cancel_pending` calls.
    pub fn cancellations(&self) -> usize {
        self.state().cancellations
    }

    /// Callbacks that returned an error during `fire`.
    pub fn failures(&self) -> usize {
        self.state().failures
    }
}

impl RefreshSignalSource for ManualRefreshSource {
    fn register_once(&self, callback: RefreshCallback) -> Result<(), RegistrationError> {
        let mut state = self.state();
        if state.unavailable {
            return Err(RegistrationError::Unavailable("manual source disabled".into()));
        }
        state.pending.push(callback);
        state.registrations += 1;
        Ok(())
    }

    fn cancel_pending(&self) {
        let mut state = self.state();
        state.pending.clear();
        state.cancellations += 1;
    }
}
