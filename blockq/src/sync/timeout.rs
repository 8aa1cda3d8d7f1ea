use std::time::Duration;

use minstant::Instant;

/// Timeout specification for blocking operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Wait until the operation can complete or the queue closes.
    Infinite,
    /// Wait for at most the specified duration. Zero checks once and returns.
    Duration(Duration),
}

impl Timeout {
    /// Resolves the timeout against the current time.
    ///
    /// A duration too large to represent as an instant waits forever.
    pub(crate) fn deadline(self) -> Option<Instant> {
        match self {
            Self::Infinite => None,
            Self::Duration(d) => Instant::now().checked_add(d),
        }
    }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Self::Duration(d)
    }
}
