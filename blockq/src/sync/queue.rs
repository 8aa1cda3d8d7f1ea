//! Bounded blocking MPMC queue.
//!
//! A FIFO buffer behind a mutex, with one condition variable for producers
//! waiting on space and one for consumers waiting on items.
//!
//! # Overview
//!
//! - [`Queue::push`] / [`Queue::pop`] block until they can complete or the
//!   queue is closed
//! - [`Queue::try_push`] / [`Queue::try_pop`] give up after a timeout
//! - [`Queue::close`] rejects all further pushes and wakes every waiter;
//!   buffered items can still be popped until the queue is drained
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use blockq::sync::Queue;
//!
//! let queue = Arc::new(Queue::bounded(2)?);
//!
//! let consumer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || {
//!         let mut sum = 0;
//!         while let Some(n) = queue.pop() {
//!             sum += n;
//!         }
//!         sum
//!     })
//! };
//!
//! for n in 1..=10 {
//!     assert!(queue.push(n));
//! }
//! queue.close();
//!
//! assert_eq!(consumer.join().unwrap(), 55);
//! # Ok::<(), blockq::QueueError>(())
//! ```
//!
//! # Closing
//!
//! Pushes fail fast on a closed queue, even when there is space. Pops keep
//! returning buffered items in order and return `None` only once the queue is
//! both closed and empty.

use std::collections::VecDeque;
use std::ptr;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use minstant::Instant;

use super::{Capacity, NoopObserver, QueueObserver, Timeout};
use crate::config::QueueConfig;
use crate::error::{PushError, QueueError};
use crate::trace::{debug, trace, warn};

/// State guarded by the queue mutex.
struct State<T> {
    buffer: VecDeque<T>,
    /// Only ever goes false to true, except that [`Queue::transfer_from`]
    /// copies the source's flag and so can reopen a closed destination.
    closed: bool,
}

/// Thread-safe FIFO queue with blocking and timed push/pop and a one-way close.
///
/// `O` receives a callback for every successful push, pop, and close; see
/// [`QueueObserver`]. Share the queue between threads with an `Arc`.
pub struct Queue<T, O: QueueObserver<T> = NoopObserver> {
    state: Mutex<State<T>>,
    /// Producers waiting for `len < capacity`.
    not_full: Condvar,
    /// Consumers waiting for `len > 0`.
    not_empty: Condvar,
    capacity: Capacity,
    label: &'static str,
    observer: O,
}

impl<T> Queue<T> {
    /// Creates an unbounded queue.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Capacity::Unbounded)
    }

    /// Creates a queue holding at most `n` items.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::ZeroCapacity`] if `n == 0`.
    pub fn bounded(n: usize) -> Result<Self, QueueError> {
        Ok(Self::with_capacity(Capacity::bounded(n)?))
    }

    #[must_use]
    pub fn with_capacity(capacity: Capacity) -> Self {
        Self::with_observer(capacity, NoopObserver)
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, O: QueueObserver<T>> Queue<T, O> {
    /// Creates a queue that reports its activity to `observer`.
    #[must_use]
    pub fn with_observer(capacity: Capacity, observer: O) -> Self {
        Self::from_config(
            &QueueConfig {
                capacity,
                ..QueueConfig::default()
            },
            observer,
        )
    }

    #[must_use]
    pub fn from_config(config: &QueueConfig, observer: O) -> Self {
        Self::from_state(
            config.capacity,
            config.label,
            observer,
            State {
                buffer: VecDeque::with_capacity(config.capacity.initial_allocation()),
                closed: false,
            },
        )
    }

    fn from_state(capacity: Capacity, label: &'static str, observer: O, state: State<T>) -> Self {
        Self {
            state: Mutex::new(state),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
            label,
            observer,
        }
    }

    /// Pushes an item, blocking while the queue is full.
    ///
    /// Returns `false` without enqueuing if the queue is closed, or becomes
    /// closed while waiting. Use [`Queue::push_with`] to get the item back.
    pub fn push(&self, item: T) -> bool {
        self.push_with(item, Timeout::Infinite).is_ok()
    }

    /// Pushes an item, waiting at most `timeout` for space.
    ///
    /// Returns `false` if the queue is closed or still full at the deadline.
    /// A zero timeout checks once without waiting.
    pub fn try_push(&self, item: T, timeout: Duration) -> bool {
        self.push_with(item, timeout).is_ok()
    }

    /// Pushes an item, returning it on failure.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::Closed`] if the queue is or becomes closed, and
    /// [`PushError::Timeout`] if the deadline passes while the queue is full.
    pub fn push_with(&self, item: T, timeout: impl Into<Timeout>) -> Result<(), PushError<T>> {
        let deadline = timeout.into().deadline();
        let capacity = self.capacity;

        let (mut state, timed_out) =
            Self::wait_until(&self.not_full, self.lock(), deadline, |state| {
                !state.closed && capacity.is_full(state.buffer.len())
            });

        if state.closed {
            return Err(PushError::Closed(item));
        }
        if timed_out {
            trace!(queue = self.label, "push timed out on full queue");
            return Err(PushError::Timeout(item));
        }

        state.buffer.push_back(item);
        // Signal before the hook so a panicking observer cannot swallow the
        // wakeup. The consumer still waits on the lock until the hook returns.
        self.not_empty.notify_one();
        if let Some(tail) = state.buffer.back() {
            self.observer.on_push(tail);
        }
        Ok(())
    }

    /// Pops the oldest item, blocking while the queue is empty.
    ///
    /// Returns `None` once the queue is closed and drained.
    #[must_use]
    pub fn pop(&self) -> Option<T> {
        self.pop_with(Timeout::Infinite)
    }

    /// Pops the oldest item, waiting at most `timeout` for one to arrive.
    #[must_use]
    pub fn try_pop(&self, timeout: Duration) -> Option<T> {
        self.pop_with(timeout)
    }

    /// Pops the oldest item, waiting according to `timeout`.
    ///
    /// Returns `None` on timeout or when the queue is closed and drained.
    #[must_use]
    pub fn pop_with(&self, timeout: impl Into<Timeout>) -> Option<T> {
        let deadline = timeout.into().deadline();

        let (mut state, timed_out) =
            Self::wait_until(&self.not_empty, self.lock(), deadline, |state| {
                !state.closed && state.buffer.is_empty()
            });

        let Some(item) = state.buffer.pop_front() else {
            if timed_out {
                trace!(queue = self.label, "pop timed out on empty queue");
            }
            return None;
        };
        self.not_full.notify_one();
        self.observer.on_pop(&item);
        drop(state);
        Some(item)
    }

    /// Closes the queue and wakes every blocked producer and consumer.
    ///
    /// Idempotent, but the observer's `on_close` hook runs on every call.
    pub fn close(&self) {
        let mut state = self.lock();
        if !state.closed {
            debug!(
                queue = self.label,
                remaining = state.buffer.len(),
                "closing queue"
            );
        }
        state.closed = true;
        self.not_full.notify_all();
        self.not_empty.notify_all();
        self.observer.on_close();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().buffer.is_empty()
    }

    /// Number of buffered items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().buffer.len()
    }

    #[must_use]
    pub const fn capacity(&self) -> Capacity {
        self.capacity
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    #[must_use]
    pub const fn observer(&self) -> &O {
        &self.observer
    }

    /// Moves the buffered items and closed flag into a new queue.
    ///
    /// The new queue has the same capacity and label and a clone of the
    /// observer. `self` is left empty with its closed flag unchanged, and its
    /// blocked producers are woken. No hooks fire for the moved items.
    #[must_use]
    pub fn take(&self) -> Self
    where
        O: Clone,
    {
        let mut state = self.lock();
        let buffer = std::mem::take(&mut state.buffer);
        let closed = state.closed;
        drop(state);

        self.not_full.notify_all();
        debug!(queue = self.label, moved = buffer.len(), "queue taken");

        Self::from_state(
            self.capacity,
            self.label,
            self.observer.clone(),
            State { buffer, closed },
        )
    }

    /// Replaces this queue's items and closed flag with those of `source`.
    ///
    /// Both queues are locked for the duration, so no operation on either can
    /// observe a partial transfer. Items previously buffered in `self` are
    /// dropped and `source` is left empty.
    ///
    /// The closed flag is copied as well: a closed `self` that receives the
    /// state of an open `source` is open again afterwards. Waiters on both queues are woken to
    /// re-check their conditions. No hooks fire.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::CapacityMismatch`] if the capacities differ; in
    /// that case neither queue is modified.
    pub fn transfer_from(&self, source: &Self) -> Result<(), QueueError> {
        if ptr::eq(self, source) {
            return Ok(());
        }
        if self.capacity != source.capacity {
            return Err(QueueError::CapacityMismatch {
                expected: self.capacity,
                found: source.capacity,
            });
        }

        // Lock in address order so concurrent transfers in opposite
        // directions cannot deadlock.
        let (mut dst, mut src) = if ptr::from_ref(self) < ptr::from_ref(source) {
            let dst = self.lock();
            (dst, source.lock())
        } else {
            let src = source.lock();
            (self.lock(), src)
        };

        let displaced = std::mem::replace(&mut dst.buffer, std::mem::take(&mut src.buffer));
        dst.closed = src.closed;
        debug!(
            queue = self.label,
            moved = dst.buffer.len(),
            closed = dst.closed,
            "queue state transferred"
        );
        drop(src);
        drop(dst);

        for signal in [
            &self.not_full,
            &self.not_empty,
            &source.not_full,
            &source.not_empty,
        ] {
            signal.notify_all();
        }
        drop(displaced);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        // State is consistent whenever a hook runs, so a panic there leaves
        // nothing to repair.
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!(queue = self.label, "recovering poisoned queue lock");
            poisoned.into_inner()
        })
    }

    /// Waits on `signal` while `blocked` holds, re-checking after every wake.
    ///
    /// Returns the guard and whether the deadline passed with `blocked` still
    /// true.
    fn wait_until<'a>(
        signal: &Condvar,
        mut state: MutexGuard<'a, State<T>>,
        deadline: Option<Instant>,
        blocked: impl Fn(&State<T>) -> bool,
    ) -> (MutexGuard<'a, State<T>>, bool) {
        while blocked(&state) {
            state = match deadline {
                None => signal.wait(state).unwrap_or_else(PoisonError::into_inner),
                Some(dl) => match dl.checked_duration_since(Instant::now()) {
                    Some(remaining) if !remaining.is_zero() => {
                        signal
                            .wait_timeout(state, remaining)
                            .unwrap_or_else(PoisonError::into_inner)
                            .0
                    }
                    _ => return (state, true),
                },
            };
        }
        (state, false)
    }
}

impl<T, O: QueueObserver<T>> Drop for Queue<T, O> {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if !state.closed {
            state.closed = true;
            self.observer.on_close();
        }
    }
}
