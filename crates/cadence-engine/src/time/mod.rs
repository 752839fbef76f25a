//! Time subsystem.
//!
//! Timestamps are relayed from the refresh source to the consumer untouched.
//! Consumers that want delta time feed them through a `FrameClock`:
//! - one `FrameClock` per consumer
//! - call `tick_at()` once per delivered tick to obtain `FrameTime`

mod frame_clock;
mod monotonic;

pub use frame_clock::{FrameClock, FrameTime};
pub use monotonic::MonotonicTime;
