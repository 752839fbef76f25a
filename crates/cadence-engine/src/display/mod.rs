//! Display queries.
//!
//! Owns the short-lived `winit` event loop used to read the monitor refresh
//! rate that software refresh sources pace themselves to.

mod probe;

pub use probe::{probe_refresh_interval, refresh_interval_from_millihertz};
