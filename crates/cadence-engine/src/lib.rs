//! Cadence engine crate.
//!
//! Drives a frame consumer from a display refresh signal: one tick per
//! accepted refresh, with exactly one one-shot registration outstanding
//! while the loop runs.

pub mod core;
pub mod display;
pub mod logging;
pub mod scheduler;
pub mod signal;
pub mod time;
