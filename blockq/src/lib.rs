//! Bounded blocking queues for passing values between threads.
//!
//! The centre of the crate is [`sync::Queue`]: a FIFO shared by any number of
//! producers and consumers, with blocking and timed variants of push and pop,
//! a one-way close that wakes every waiter, and observer hooks that see each
//! successful push, pop, and close.
//!
//! ```
//! use std::time::Duration;
//!
//! use blockq::sync::Queue;
//!
//! let queue = Queue::bounded(1)?;
//! assert!(queue.push("first"));
//! assert!(!queue.try_push("second", Duration::from_millis(10)));
//!
//! queue.close();
//! assert_eq!(queue.pop(), Some("first"));
//! assert_eq!(queue.pop(), None);
//! # Ok::<(), blockq::QueueError>(())
//! ```

pub mod config;
pub mod error;
pub mod sync;
pub mod trace;

pub use config::QueueConfig;
pub use error::{PushError, QueueError};
pub use sync::{Capacity, Queue, Timeout};
pub use trace::init_tracing;
