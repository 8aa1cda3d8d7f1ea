//! Construction-time settings for a [`Queue`](crate::sync::Queue).

use crate::sync::Capacity;

/// Configuration for a queue.
///
/// ```
/// use blockq::QueueConfig;
/// use blockq::sync::{Capacity, NoopObserver, Queue};
///
/// let config = QueueConfig {
///     capacity: Capacity::bounded(64)?,
///     label: "ingest",
/// };
///
/// let queue: Queue<Vec<u8>> = Queue::from_config(&config, NoopObserver);
/// assert_eq!(queue.capacity().get(), Some(64));
/// assert_eq!(queue.label(), "ingest");
/// # Ok::<(), blockq::QueueError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Maximum number of buffered items.
    pub capacity: Capacity,
    /// Name attached to this queue's log events.
    pub label: &'static str,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: Capacity::Unbounded,
            label: "blockq",
        }
    }
}
