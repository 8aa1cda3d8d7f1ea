use std::fmt;
use std::num::NonZeroUsize;

use crate::error::QueueError;

/// Upper bound on slots reserved up front for a bounded buffer.
const PREALLOC_LIMIT: usize = 1024;

/// Maximum number of items a queue may buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Capacity {
    /// At most `n` buffered items; producers block once it is reached.
    Bounded(NonZeroUsize),
    /// No limit; producers never wait for space.
    #[default]
    Unbounded,
}

impl Capacity {
    /// Creates a bounded capacity.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::ZeroCapacity`] if `n == 0`.
    pub const fn bounded(n: usize) -> Result<Self, QueueError> {
        match NonZeroUsize::new(n) {
            Some(n) => Ok(Self::Bounded(n)),
            None => Err(QueueError::ZeroCapacity),
        }
    }

    /// The numeric limit, or `None` when unbounded.
    #[must_use]
    pub const fn get(self) -> Option<usize> {
        match self {
            Self::Bounded(n) => Some(n.get()),
            Self::Unbounded => None,
        }
    }

    #[must_use]
    pub const fn is_bounded(self) -> bool {
        matches!(self, Self::Bounded(_))
    }

    /// Whether a buffer holding `len` items has no room for another.
    pub(crate) const fn is_full(self, len: usize) -> bool {
        match self {
            Self::Bounded(n) => len >= n.get(),
            Self::Unbounded => false,
        }
    }

    pub(crate) fn initial_allocation(self) -> usize {
        self.get().map_or(0, |n| n.min(PREALLOC_LIMIT))
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(n) => write!(f, "{n}"),
            Self::Unbounded => f.write_str("unbounded"),
        }
    }
}

impl From<NonZeroUsize> for Capacity {
    fn from(n: NonZeroUsize) -> Self {
        Self::Bounded(n)
    }
}
