//! Consumer-facing contracts.
//!
//! The scheduler hands each accepted tick to exactly one `FrameConsumer`.
//! Hosts that need several per-frame hooks register them on a
//! `FrameListeners` registry and hand the registry to the scheduler.

mod consumer;
mod listeners;

pub use consumer::FrameConsumer;
pub use listeners::{FrameListener, FrameListeners};
