use std::sync::Arc;

use super::RegistrationError;
use crate::time::MonotonicTime;

/// One-shot refresh callback.
///
/// Errors are returned to the source, which logs them; the source keeps
/// delivering other registrations.
pub type RefreshCallback = Box<dyn FnOnce(MonotonicTime) -> anyhow::Result<()> + Send + 'static>;

/// Contract for anything that can notify once at the next display refresh.
///
/// Implementations must deliver on their own dispatch context and never call
/// the callback from inside `register_once`; callers may hold locks across
/// registration.
pub trait RefreshSignalSource: Send + Sync {
    /// Schedules `callback` to run once, at the next refresh.
    fn register_once(&self, callback: RefreshCallback) -> Result<(), RegistrationError>;

    /// Drops every pending registration. Safe to call with nothing pending.
    ///
    /// A callback that is already being delivered is not affected.
    fn cancel_pending(&self);
}

impl<S> RefreshSignalSource for Arc<S>
where
    S: RefreshSignalSource + ?Sized,
{
    fn register_once(&self, callback: RefreshCallback) -> Result<(), RegistrationError> {
        (**self).register_once(callback)
    }

    fn cancel_pending(&self) {
        (**self).cancel_pending()
    }
}
