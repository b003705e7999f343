use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{layout, MeasuredSize, TextMetrics};
use crate::markup::StyledRun;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CacheKey {
    run: u64,
    width: u32,
}

impl CacheKey {
    fn new(run: &StyledRun, max_width: f32) -> Self {
        Self {
            run: run.fingerprint(),
            width: max_width.to_bits(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct CacheEntry {
    key: CacheKey,
    size: MeasuredSize,
}

struct Shared {
    last: Mutex<Option<CacheEntry>>,
    /// Bumped by every request that misses the cache; a deferred result is
    /// only published if its generation is still current.
    generation: AtomicU64,
    layouts: AtomicUsize,
    tx: watch::Sender<MeasuredSize>,
}

impl Shared {
    fn last(&self) -> MutexGuard<'_, Option<CacheEntry>> {
        self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cached(&self, key: CacheKey) -> Option<MeasuredSize> {
        (*self.last())
            .filter(|entry| entry.key == key)
            .map(|entry| entry.size)
    }

    fn compute(&self, run: &StyledRun, max_width: f32, metrics: &TextMetrics) -> MeasuredSize {
        self.layouts.fetch_add(1, Ordering::Relaxed);
        layout(run, max_width, metrics)
    }

    fn next_generation(&self) -> u64 {
        let _guard = self.last();
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Store and publish `size` unless a newer request has been issued.
    fn store_if_current(&self, generation: u64, key: CacheKey, size: MeasuredSize) -> bool {
        let mut last = self.last();
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        *last = Some(CacheEntry { key, size });
        self.tx.send_if_modified(|current| {
            if *current == size {
                false
            } else {
                *current = size;
                true
            }
        });
        true
    }
}

/// Measured size of one visible message body.
///
/// Remembers the last (run, width) it was asked about and answers repeats
/// from that entry. Subscribers see a new value only when the size actually
/// changes.
pub struct MeasuredText {
    metrics: TextMetrics,
    shared: Arc<Shared>,
    in_flight: Option<JoinHandle<()>>,
}

impl MeasuredText {
    pub fn new(metrics: TextMetrics) -> Self {
        let (tx, _) = watch::channel(MeasuredSize::ZERO);
        Self {
            metrics,
            shared: Arc::new(Shared {
                last: Mutex::new(None),
                generation: AtomicU64::new(0),
                layouts: AtomicUsize::new(0),
                tx,
            }),
            in_flight: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<MeasuredSize> {
        self.shared.tx.subscribe()
    }

    /// Last published size.
    pub fn current(&self) -> MeasuredSize {
        *self.shared.tx.borrow()
    }

    /// Number of layouts actually performed.
    pub fn layouts(&self) -> usize {
        self.shared.layouts.load(Ordering::Relaxed)
    }

    pub fn measure(&mut self, run: &StyledRun, max_width: f32) -> MeasuredSize {
        let key = CacheKey::new(run, max_width);
        if let Some(size) = self.shared.cached(key) {
            return self.settle_cached(key, size);
        }
        let generation = self.supersede();
        let size = self.shared.compute(run, max_width, &self.metrics);
        self.shared.store_if_current(generation, key, size);
        size
    }

    /// Measure on the blocking pool and publish the result to subscribers.
    ///
    /// Returns the size straight away when it is already known. A newer
    /// request (deferred or not) makes an unfinished one irrelevant: its
    /// result is dropped. Outside a Tokio runtime this measures inline.
    pub fn measure_deferred(&mut self, run: Arc<StyledRun>, max_width: f32) -> Option<MeasuredSize> {
        let key = CacheKey::new(&run, max_width);
        if let Some(size) = self.shared.cached(key) {
            return Some(self.settle_cached(key, size));
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return Some(self.measure(&run, max_width));
        };

        let generation = self.supersede();
        let shared = Arc::clone(&self.shared);
        let metrics = self.metrics.clone();
        self.in_flight = Some(handle.spawn_blocking(move || {
            if shared.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            let size = shared.compute(&run, max_width, &metrics);
            if !shared.store_if_current(generation, key, size) {
                tracing::trace!("Dropped superseded measurement");
            }
        }));
        None
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// A cache hit is still the newest request: an unfinished deferred
    /// measurement must not land after it.
    fn settle_cached(&mut self, key: CacheKey, size: MeasuredSize) -> MeasuredSize {
        if self.in_flight.is_some() {
            let generation = self.supersede();
            self.shared.store_if_current(generation, key, size);
        }
        size
    }

    fn supersede(&mut self) -> u64 {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
        self.shared.next_generation()
    }
}

impl Drop for MeasuredText {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}
