use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, ensure};

use super::{RefreshCallback, RefreshSignalSource, RegistrationError};
use crate::display::refresh_interval_from_millihertz;
use crate::time::MonotonicTime;

/// Interval source configuration.
#[derive(Debug, Clone)]
pub struct IntervalSourceConfig {
    pub refresh_interval: Duration,
    pub thread_name: String,
}

impl IntervalSourceConfig {
    /// Builds a config from a monitor refresh rate in millihertz
    /// (e.g. `59_940` for 59.94 Hz). Zero keeps the default interval.
    pub fn from_refresh_rate_millihertz(millihertz: u32) -> Self {
        let mut config = Self::default();
        if let Some(interval) = refresh_interval_from_millihertz(millihertz) {
            config.refresh_interval = interval;
        }
        config
    }
}

impl Default for IntervalSourceConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_nanos(16_666_667),
            thread_name: "cadence-refresh".to_string(),
        }
    }
}

#[derive(Default)]
struct IntervalState {
    pending: Vec<RefreshCallback>,
    shutdown: bool,
}

struct Shared {
    state: Mutex<IntervalState>,
    wake: Condvar,
    interval: Duration,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, IntervalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Software refresh signal driven by one dedicated delivery thread.
///
/// Signals land on a fixed grid anchored when the source is created. The
/// thread sleeps while nothing is registered; boundaries that pass while a
/// callback is slow are skipped rather than delivered in a burst.
pub struct IntervalRefreshSource {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl IntervalRefreshSource {
    pub fn new(config: IntervalSourceConfig) -> Result<Self> {
        ensure!(
            !config.refresh_interval.is_zero(),
            "refresh interval must be non-zero"
        );

        let shared = Arc::new(Shared {
            state: Mutex::new(IntervalState::default()),
            wake: Condvar::new(),
            interval: config.refresh_interval,
        });

        let worker = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || run(&worker))
            .with_context(|| format!("failed to spawn refresh thread `{}`", config.thread_name))?;

        log::debug!(
            "interval refresh source started ({:?} per refresh)",
            config.refresh_interval
        );

        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    pub fn refresh_interval(&self) -> Duration {
        self.shared.interval
    }
}

impl RefreshSignalSource for IntervalRefreshSource {
    fn register_once(&self, callback: RefreshCallback) -> Result<(), RegistrationError> {
        let mut state = self.shared.state();
        if state.shutdown {
            return Err(RegistrationError::Shutdown);
        }
        state.pending.push(callback);
        self.shared.wake.notify_one();
        Ok(())
    }

    fn cancel_pending(&self) {
        self.shared.state().pending.clear();
    }
}

impl Drop for IntervalRefreshSource {
    fn drop(&mut self) {
        self.shared.state().shutdown = true;
        self.shared.wake.notify_one();

        if let Some(thread) = self.thread.take() {
            // The last owner may be a callback running on the refresh thread.
            if thread.thread().id() == thread::current().id() {
                return;
            }
            if thread.join().is_err() {
                log::error!("refresh thread panicked");
            }
        }
    }
}

/// First grid point strictly after `now`.
fn next_boundary(origin: Instant, interval: Duration, now: Instant) -> Instant {
    let since = now.saturating_duration_since(origin).as_nanos();
    let step = interval.as_nanos();
    let ticks = since / step + 1;
    let offset = u64::try_from(ticks * step).unwrap_or(u64::MAX);
    origin + Duration::from_nanos(offset)
}

/// Marks the source shut down when the refresh thread exits for any reason,
/// so registrations fail instead of queueing behind a dead thread.
struct ShutdownOnExit<'a>(&'a Shared);

impl Drop for ShutdownOnExit<'_> {
    fn drop(&mut self) {
        let mut state = self.0.state();
        state.shutdown = true;
        state.pending.clear();
    }
}

fn run(shared: &Shared) {
    let _exit = ShutdownOnExit(shared);
    let origin = Instant::now();

    loop {
        let mut state = shared.state();
        while state.pending.is_empty() && !state.shutdown {
            state = shared.wake.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        if state.shutdown {
            break;
        }

        let deadline = next_boundary(origin, shared.interval, Instant::now());
        loop {
            let now = Instant::now();
            if now >= deadline || state.shutdown {
                break;
            }
            state = shared
                .wake
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        if state.shutdown {
            break;
        }

        // Everything registered up to the boundary belongs to this refresh.
        let callbacks = mem::take(&mut state.pending);
        drop(state);

        let timestamp = MonotonicTime::from_instant(deadline);
        for callback in callbacks {
            match panic::catch_unwind(AssertUnwindSafe(|| callback(timestamp))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::error!("refresh callback failed at {timestamp}: {e:#}"),
                Err(_) => log::error!("refresh callback panicked at {timestamp}"),
            }
        }
    }

    log::debug!("refresh thread exiting");
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn next_boundary_skips_missed_points() {
        let origin = Instant::now();
        let interval = Duration::from_millis(10);
        let now = origin + Duration::from_millis(35);
        assert_eq!(next_boundary(origin, interval, now), origin + Duration::from_millis(40));
    }

    #[test]
    fn next_boundary_is_strictly_after_now() {
        let origin = Instant::now();
        let interval = Duration::from_millis(10);
        let now = origin + Duration::from_millis(20);
        assert_eq!(next_boundary(origin, interval, now), origin + Duration::from_millis(30));
    }

    #[test]
    fn config_from_refresh_rate() {
        let config = IntervalSourceConfig::from_refresh_rate_millihertz(120_000);
        assert_eq!(config.refresh_interval, Duration::from_nanos(8_333_333));
        let fallback = IntervalSourceConfig::from_refresh_rate_millihertz(0);
        assert_eq!(fallback.refresh_interval, Duration::from_nanos(16_666_667));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = IntervalSourceConfig {
            refresh_interval: Duration::ZERO,
            ..IntervalSourceConfig::default()
        };
        assert!(IntervalRefreshSource::new(config).is_err());
    }

    #[test]
    fn delivers_a_registration_once() {
        let source = IntervalRefreshSource::new(IntervalSourceConfig {
            refresh_interval: Duration::from_millis(2),
            ..IntervalSourceConfig::default()
        })
        .unwrap();

        let (tx, rx) = mpsc::channel();
        source
            .register_once(Box::new(move |ts: MonotonicTime| -> anyhow::Result<()> {
                tx.send(ts).ok();
                Ok(())
            }))
            .unwrap();

        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
        // Sender was consumed with the callback; no second delivery.
        assert!(rx.recv_timeout(Duration::from_millis(20)).is_err());
    }

    #[test]
    fn panicking_callback_does_not_kill_the_thread() {
        let source = IntervalRefreshSource::new(IntervalSourceConfig {
            refresh_interval: Duration::from_millis(2),
            ..IntervalSourceConfig::default()
        })
        .unwrap();

        source
            .register_once(Box::new(|_: MonotonicTime| -> anyhow::Result<()> {
                panic!("callback blew up")
            }))
            .unwrap();

        let (tx, rx) = mpsc::channel();
        source
            .register_once(Box::new(move |ts: MonotonicTime| -> anyhow::Result<()> {
                tx.send(ts).ok();
                Ok(())
            }))
            .unwrap();
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());

        let (tx, rx) = mpsc::channel();
        source
            .register_once(Box::new(move |ts: MonotonicTime| -> anyhow::Result<()> {
                tx.send(ts).ok();
                Ok(())
            }))
            .unwrap();
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn exit_guard_marks_source_shut_down() {
        let shared = Shared {
            state: Mutex::new(IntervalState::default()),
            wake: Condvar::new(),
            interval: Duration::from_millis(1),
        };
        shared
            .state()
            .pending
            .push(Box::new(|_: MonotonicTime| -> anyhow::Result<()> { Ok(()) }));
        drop(ShutdownOnExit(&shared));

        let state = shared.state();
        assert!(state.shutdown);
        assert!(state.pending.is_empty());
    }

    #[test]
    fn cancelled_registration_never_fires() {
        let source = IntervalRefreshSource::new(IntervalSourceConfig {
            refresh_interval: Duration::from_millis(50),
            ..IntervalSourceConfig::default()
        })
        .unwrap();

        let (tx, rx) = mpsc::channel::<MonotonicTime>();
        source
            .register_once(Box::new(move |ts: MonotonicTime| -> anyhow::Result<()> {
                tx.send(ts).ok();
                Ok(())
            }))
            .unwrap();
        source.cancel_pending();

        assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());
    }
}
