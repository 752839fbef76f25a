use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use anyhow::{Context, Result};

use super::FrameConsumer;
use crate::time::MonotonicTime;

type ListenerFn = dyn Fn(MonotonicTime) -> Result<()> + Send + Sync;

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(u64, Arc<ListenerFn>)>,
}

/// Fan-out consumer: forwards every tick to each registered listener.
///
/// Clones share the same registry.
#[derive(Clone, Default)]
pub struct FrameListeners {
    registry: Arc<Mutex<Registry>>,
}

/// Registration handle returned by [`FrameListeners::add`].
///
/// The listener stays installed for as long as the handle is alive.
#[must_use = "dropping the handle removes the listener"]
pub struct FrameListener {
    registry: Weak<Mutex<Registry>>,
    id: Option<u64>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FrameListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `listener`; it runs after every listener added before it.
    pub fn add<F>(&self, listener: F) -> FrameListener
    where
        F: Fn(MonotonicTime) -> Result<()> + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push((id, Arc::new(listener)));

        FrameListener {
            registry: Arc::downgrade(&self.registry),
            id: Some(id),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.registry).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs every listener with `timestamp`, stopping at the first error.
    ///
    /// The list is snapshotted first: listeners added or removed while the
    /// fan-out runs take effect on the next tick.
    pub fn dispatch(&self, timestamp: MonotonicTime) -> Result<()> {
        let snapshot: Vec<(u64, Arc<ListenerFn>)> = lock(&self.registry).entries.clone();

        for (id, listener) in snapshot {
            listener(timestamp).with_context(|| format!("frame listener #{id} failed"))?;
        }

        Ok(())
    }
}

impl FrameConsumer for FrameListeners {
    fn on_tick(&mut self, timestamp: MonotonicTime) -> Result<()> {
        self.dispatch(timestamp)
    }
}

impl FrameListener {
    /// Unregisters the listener. Calling it more than once is harmless.
    pub fn remove(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).entries.retain(|(entry, _)| *entry != id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some() && self.registry.strong_count() > 0
    }
}

impl Drop for FrameListener {
    fn drop(&mut self) {
        self.remove();
    }
}
