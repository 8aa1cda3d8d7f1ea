//! Error types for queue construction, transfer, and rejected pushes.
//!
//! Closed queues and expired timeouts are ordinary outcomes, so they surface
//! as `false`, `None`, or a [`PushError`] that hands the item back. Only
//! misconfiguration is reported through [`QueueError`].

use thiserror::Error;

use crate::sync::Capacity;

/// Misuse of the queue's fixed configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// A bounded queue was requested with room for zero items.
    #[error("bounded queue capacity must be greater than 0")]
    ZeroCapacity,
    /// Two queues with different capacities were asked to exchange state.
    #[error("cannot transfer between queues of different capacities: {expected} != {found}")]
    CapacityMismatch {
        /// Capacity of the destination queue.
        expected: Capacity,
        /// Capacity of the source queue.
        found: Capacity,
    },
}

/// A push that did not enqueue its item.
///
/// The rejected item is always returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError<T> {
    /// The queue was closed before space became available.
    #[error("queue is closed")]
    Closed(T),
    /// The deadline passed while the queue was still full.
    #[error("timed out waiting for queue capacity")]
    Timeout(T),
}

impl<T> PushError<T> {
    /// Returns the item that failed to be enqueued.
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Closed(item) | Self::Timeout(item) => item,
        }
    }

    /// Whether the push failed because the queue is closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }

    /// Whether the push failed because its deadline elapsed.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
