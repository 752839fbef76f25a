use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use anyhow::Context;

use super::handle::{Control, SchedulerHandle};
use crate::core::FrameConsumer;
use crate::signal::{RefreshSignalSource, RegistrationError};
use crate::time::MonotonicTime;

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "non-string panic payload"
    }
}

/// Odd generations are RUNNING, even ones STOPPED.
fn is_running(generation: u64) -> bool {
    generation & 1 == 1
}

struct Inner<S, C> {
    this: Weak<Inner<S, C>>,
    source: S,
    consumer: Mutex<C>,

    /// Bumped by every start/stop transition. A registration only delivers
    /// if the generation it was armed for is still current.
    generation: AtomicU64,

    /// Serializes start/stop, including the register/cancel call they make.
    /// Never taken on the delivery path.
    control: Mutex<()>,
}

impl<S, C> Inner<S, C>
where
    S: RefreshSignalSource + 'static,
    C: FrameConsumer + 'static,
{
    fn arm(&self, generation: u64) -> Result<(), RegistrationError> {
        let this = self.this.clone();
        self.source.register_once(Box::new(move |timestamp: MonotonicTime| {
            // Scheduler dropped while the registration was in flight.
            let Some(inner) = this.upgrade() else {
                return Ok(());
            };
            inner.on_refresh_signal(generation, timestamp)
        }))
    }

    fn on_refresh_signal(&self, generation: u64, timestamp: MonotonicTime) -> anyhow::Result<()> {
        if self.generation.load(Ordering::Acquire) != generation {
            log::trace!("discarding refresh signal at {timestamp}: armed for a stopped run");
            return Ok(());
        }

        log::trace!("tick at {timestamp}");
        let delivered = {
            let mut consumer = self.consumer.lock().unwrap_or_else(PoisonError::into_inner);
            // A panicking consumer is a failed frame, not a dead refresh thread.
            panic::catch_unwind(AssertUnwindSafe(|| consumer.on_tick(timestamp)))
                .unwrap_or_else(|payload| {
                    Err(anyhow::anyhow!("consumer panicked: {}", panic_message(&*payload)))
                })
        };

        if let Err(e) = delivered {
            self.halt(generation);
            log::error!("frame consumer failed at {timestamp}, frame loop halted: {e:#}");
            return Err(e.context("frame consumer failed"));
        }

        // Always arm one step ahead; a stop that raced the delivery is caught
        // by the generation check when this registration fires.
        if let Err(e) = self.arm(generation) {
            self.halt(generation);
            log::warn!("failed to re-arm refresh signal, frame loop halted: {e}");
            return Err(e).context("failed to re-arm refresh signal");
        }

        Ok(())
    }

    /// Moves `generation` to STOPPED unless a start/stop already moved on.
    fn halt(&self, generation: u64) {
        let _ = self.generation.compare_exchange(
            generation,
            generation + 1,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

impl<S, C> Control for Inner<S, C>
where
    S: RefreshSignalSource + 'static,
    C: FrameConsumer + 'static,
{
    fn start(&self) -> Result<(), RegistrationError> {
        let _guard = self.control.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self.generation.load(Ordering::Acquire);
        if is_running(current) {
            return Ok(());
        }

        let armed = current + 1;
        self.generation.store(armed, Ordering::Release);

        if let Err(e) = self.arm(armed) {
            self.generation.store(armed + 1, Ordering::Release);
            log::warn!("frame loop failed to start: {e}");
            return Err(e);
        }

        log::debug!("frame loop started");
        Ok(())
    }

    fn stop(&self) {
        let _guard = self.control.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self.generation.load(Ordering::Acquire);
        if !is_running(current) {
            return;
        }

        self.generation.store(current + 1, Ordering::Release);
        self.source.cancel_pending();
        log::debug!("frame loop stopped");
    }

    fn is_running(&self) -> bool {
        is_running(self.generation.load(Ordering::Acquire))
    }
}

/// Drives a [`FrameConsumer`] from a [`RefreshSignalSource`].
///
/// `start`/`stop` are idempotent and safe from any thread, including from
/// inside the consumer's own tick (through a [`SchedulerHandle`]). Stopping is
/// best-effort: a signal that fired concurrently is discarded on arrival,
/// so the loop winds down within one refresh interval.
///
/// A consumer error or panic halts the loop; `start` brings it back.
///
/// `start` and `stop` hold an internal lock while calling `register_once` and
/// `cancel_pending`. Sources must therefore never deliver synchronously from
/// inside those calls (see [`RefreshSignalSource`]); a source that does would
/// deadlock on a `start` or `stop` issued by the consumer.
///
/// Dropping the scheduler stops it; registrations still held by the source
/// become no-ops.
pub struct FrameScheduler<S, C>
where
    S: RefreshSignalSource + 'static,
    C: FrameConsumer + 'static,
{
    inner: Arc<Inner<S, C>>,
}

impl<S, C> FrameScheduler<S, C>
where
    S: RefreshSignalSource + 'static,
    C: FrameConsumer + 'static,
{
    /// Creates a stopped scheduler. Nothing is registered until `start`.
    pub fn new(source: S, consumer: C) -> Self {
        let inner = Arc::new_cyclic(|this| Inner {
            this: this.clone(),
            source,
            consumer: Mutex::new(consumer),
            generation: AtomicU64::new(0),
            control: Mutex::new(()),
        });
        Self { inner }
    }

    /// Starts ticking from the next refresh.
    ///
    /// On registration failure the scheduler stays stopped; the caller may
    /// retry.
    pub fn start(&self) -> Result<(), RegistrationError> {
        self.inner.start()
    }

    pub fn stop(&self) {
        self.inner.stop();
    }

    pub fn is_running(&self) -> bool {
        Control::is_running(&*self.inner)
    }

    pub fn handle(&self) -> SchedulerHandle {
        let control: Arc<dyn Control> = self.inner.clone();
        SchedulerHandle::new(Arc::downgrade(&control))
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }

    /// Runs `f` with exclusive access to the consumer.
    ///
    /// Blocks while a tick is being delivered. Do not call from inside the
    /// consumer's own tick.
    pub fn with_consumer<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        let mut consumer = self
            .inner
            .consumer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut consumer)
    }
}

impl<S, C> Drop for FrameScheduler<S, C>
where
    S: RefreshSignalSource + 'static,
    C: FrameConsumer + 'static,
{
    fn drop(&mut self) {
        self.inner.stop();
    }
}
