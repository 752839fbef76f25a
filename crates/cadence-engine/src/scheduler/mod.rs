//! Frame scheduler.
//!
//! Owns the running/stopped state, keeps exactly one live one-shot
//! registration with the refresh source while running, and forwards each
//! accepted refresh signal to the frame consumer.
//!
//! Lifecycle:
//! - `start()` arms the first registration
//! - every delivered tick re-arms the next one before returning
//! - `stop()` cancels; a signal already in flight is discarded on arrival

mod frame_scheduler;
mod handle;

pub use frame_scheduler::FrameScheduler;
pub use handle::SchedulerHandle;
