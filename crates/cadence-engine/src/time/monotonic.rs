use std::fmt;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Monotonic timestamp in nanoseconds with no defined epoch.
///
/// Only differences between two values are meaningful.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MonotonicTime(u64);

static ORIGIN: OnceLock<Instant> = OnceLock::new();

impl MonotonicTime {
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Current time relative to a process-wide origin captured on first use.
    pub fn now() -> Self {
        Self::from_instant(Instant::now())
    }

    /// Converts an `Instant` onto the same timeline as [`MonotonicTime::now`].
    ///
    /// Instants taken before the origin map to zero.
    pub fn from_instant(instant: Instant) -> Self {
        let origin = *ORIGIN.get_or_init(Instant::now);
        let nanos = instant.saturating_duration_since(origin).as_nanos();
        Self(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Time elapsed since `earlier`, or zero if `earlier` is later than `self`.
    pub fn saturating_duration_since(self, earlier: MonotonicTime) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }
}

impl fmt::Display for MonotonicTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}
