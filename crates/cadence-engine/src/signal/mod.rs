//! Refresh signal sources.
//!
//! A source accepts one-shot registrations ("call me once at the next
//! refresh") and delivers each on its own dispatch context. Two reference
//! sources are provided:
//! - `ManualRefreshSource`: fired explicitly, for tests and headless hosts
//! - `IntervalRefreshSource`: a dedicated thread ticking on a fixed grid

mod error;
mod interval;
mod manual;
mod source;

pub use error::RegistrationError;
pub use interval::{IntervalRefreshSource, IntervalSourceConfig};
pub use manual::ManualRefreshSource;
pub use source::{RefreshCallback, RefreshSignalSource};
