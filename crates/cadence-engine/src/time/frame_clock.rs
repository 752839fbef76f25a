use std::time::Duration;

use super::MonotonicTime;

/// Frame timing snapshot derived from a delivered tick.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Timestamp relayed by the refresh source.
    pub timestamp: MonotonicTime,

    /// Time since the previous tick, in seconds (clamped).
    pub dt: f32,

    /// Time since the first tick of the current run, in seconds (unclamped).
    pub elapsed: f64,

    /// Frame counter within the current run.
    pub frame_index: u64,
}

/// Turns relayed refresh timestamps into `FrameTime` snapshots.
///
/// Unlike a wall-clock frame timer, the clock never samples time itself: the
/// refresh source owns the timeline, the clock only measures between ticks.
///
/// Delta time is clamped to avoid pathological values when the loop was
/// paused, the process stalled, or two signals carried the same timestamp.
#[derive(Debug, Clone)]
pub struct FrameClock {
    first: Option<MonotonicTime>,
    last: Option<MonotonicTime>,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a new clock with default clamps.
    ///
    /// Clamp rationale:
    /// - minimum keeps integrators away from zero-dt on duplicated timestamps
    /// - maximum prevents simulation explosions after long stalls
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            first: None,
            last: None,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Forgets the baseline; the next tick starts a new run at frame 0.
    ///
    /// Call after the scheduler was stopped and started again so the pause
    /// is not reported as one long frame.
    pub fn reset(&mut self) {
        self.first = None;
        self.last = None;
        self.frame_index = 0;
    }

    /// Advances the clock to `timestamp` and returns a new `FrameTime`.
    pub fn tick_at(&mut self, timestamp: MonotonicTime) -> FrameTime {
        let first = *self.first.get_or_insert(timestamp);
        let dt = match self.last {
            Some(last) => timestamp
                .saturating_duration_since(last)
                .clamp(self.dt_min, self.dt_max),
            None => self.dt_min,
        };

        self.last = Some(timestamp);

        let ft = FrameTime {
            timestamp,
            dt: dt.as_secs_f32(),
            elapsed: timestamp.saturating_duration_since(first).as_secs_f64(),
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }

    /// Number of ticks observed in the current run.
    pub fn frames(&self) -> u64 {
        self.frame_index
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
