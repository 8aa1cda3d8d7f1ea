//! Synchronization primitives for in-process communication.
//!
//! This module provides the blocking [`Queue`] along with the types that
//! describe its capacity, wait deadlines, and observation hooks.

mod capacity;
pub mod observer;
pub mod queue;
mod timeout;

pub use capacity::Capacity;
pub use observer::{CountingObserver, NoopObserver, ObserverStats, QueueObserver, TracingObserver};
pub use queue::Queue;
pub use timeout::Timeout;
