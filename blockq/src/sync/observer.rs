//! Observation hooks for queue activity.
//!
//! A [`QueueObserver`] is handed to a [`Queue`](super::Queue) at construction
//! and is told about every successful push and pop and every `close()` call.
//! Observers only see shared references and return nothing, so they cannot
//! alter or veto the operation that triggered them.
//!
//! # Locking
//!
//! Hooks run while the queue's lock is held. An observer must not call back
//! into the blocking operations of the queue that invoked it; doing so
//! deadlocks the calling thread.
//!
//! Waiters are signalled before a hook runs, so a panicking hook does not
//! strand blocked threads. The panic propagates to the caller of the queue
//! operation; for a pop that means the removed item is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::QueueConfig;
use crate::trace::{debug, trace};

/// Side-effect hooks fired by a queue after each successful state change.
///
/// Every method defaults to doing nothing, so implementors override only the
/// events they care about.
pub trait QueueObserver<T> {
    /// Called once per successful push, after `item` is at the tail.
    fn on_push(&self, _item: &T) {}

    /// Called once per successful pop with the item just removed.
    fn on_pop(&self, _item: &T) {}

    /// Called on every `close()` call, and when an open queue is dropped.
    fn on_close(&self) {}
}

/// Observer that ignores all events. The default for [`Queue`](super::Queue).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NoopObserver;

impl<T> QueueObserver<T> for NoopObserver {}

impl<T, O: QueueObserver<T> + ?Sized> QueueObserver<T> for Arc<O> {
    #[inline]
    fn on_push(&self, item: &T) {
        (**self).on_push(item);
    }

    #[inline]
    fn on_pop(&self, item: &T) {
        (**self).on_pop(item);
    }

    #[inline]
    fn on_close(&self) {
        (**self).on_close();
    }
}

impl<T, O: QueueObserver<T> + ?Sized> QueueObserver<T> for &O {
    #[inline]
    fn on_push(&self, item: &T) {
        (**self).on_push(item);
    }

    #[inline]
    fn on_pop(&self, item: &T) {
        (**self).on_pop(item);
    }

    #[inline]
    fn on_close(&self) {
        (**self).on_close();
    }
}

/// Point-in-time counters captured from a [`CountingObserver`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserverStats {
    pub pushed: u64,
    pub popped: u64,
    pub closed: u64,
}

impl ObserverStats {
    /// Items pushed but not yet popped.
    #[must_use]
    pub const fn in_flight(&self) -> u64 {
        self.pushed.saturating_sub(self.popped)
    }
}

/// Observer that counts events with relaxed atomics.
///
/// Share it with the queue through an `Arc` to read the counters while the
/// queue is live:
///
/// ```
/// use std::sync::Arc;
///
/// use blockq::sync::{Capacity, CountingObserver, Queue};
///
/// let stats = Arc::new(CountingObserver::new());
/// let queue = Queue::with_observer(Capacity::Unbounded, Arc::clone(&stats));
///
/// assert!(queue.push(1));
/// assert_eq!(queue.pop(), Some(1));
/// assert_eq!(stats.stats().pushed, 1);
/// assert_eq!(stats.stats().popped, 1);
/// ```
#[derive(Debug, Default)]
pub struct CountingObserver {
    pushed: AtomicU64,
    popped: AtomicU64,
    closed: AtomicU64,
}

impl CountingObserver {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pushed: AtomicU64::new(0),
            popped: AtomicU64::new(0),
            closed: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn stats(&self) -> ObserverStats {
        ObserverStats {
            pushed: self.pushed.load(Ordering::Relaxed),
            popped: self.popped.load(Ordering::Relaxed),
            closed: self.closed.load(Ordering::Relaxed),
        }
    }
}

impl<T> QueueObserver<T> for CountingObserver {
    fn on_push(&self, _item: &T) {
        self.pushed.fetch_add(1, Ordering::Relaxed);
    }

    fn on_pop(&self, _item: &T) {
        self.popped.fetch_add(1, Ordering::Relaxed);
    }

    fn on_close(&self) {
        self.closed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Observer that reports events through the crate's log macros.
///
/// Push and pop are logged at trace level, close at debug level. Produces no
/// output unless the `tracing` feature is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingObserver {
    label: &'static str,
}

impl TracingObserver {
    #[must_use]
    pub const fn new(label: &'static str) -> Self {
        Self { label }
    }

    #[must_use]
    pub const fn from_config(config: &QueueConfig) -> Self {
        Self::new(config.label)
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::from_config(&QueueConfig::default())
    }
}

impl<T> QueueObserver<T> for TracingObserver {
    fn on_push(&self, _item: &T) {
        trace!(queue = self.label, "item pushed");
    }

    fn on_pop(&self, _item: &T) {
        trace!(queue = self.label, "item popped");
    }

    fn on_close(&self) {
        debug!(queue = self.label, "close observed");
    }
}
