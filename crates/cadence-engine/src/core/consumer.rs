use anyhow::Result;

use crate::time::MonotonicTime;

/// Per-frame entry point driven by the scheduler.
///
/// Called on the refresh source's delivery context, never concurrently with
/// itself. Returning an error halts the loop until it is started again.
pub trait FrameConsumer: Send {
    fn on_tick(&mut self, timestamp: MonotonicTime) -> Result<()>;
}

impl<F> FrameConsumer for F
where
    F: FnMut(MonotonicTime) -> Result<()> + Send,
{
    fn on_tick(&mut self, timestamp: MonotonicTime) -> Result<()> {
        self(timestamp)
    }
}
