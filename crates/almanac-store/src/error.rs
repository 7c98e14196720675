//! Error types for the snapshot store and scheduler.

use std::error::Error;
use std::fmt;

use almanac_core::SampleError;

/// Errors from store mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// The snapshot does not carry exactly one slot per catalog metric.
    MetricCountMismatch {
        /// Slots the store was created for.
        expected: usize,
        /// Slots carried by the rejected snapshot.
        found: usize,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MetricCountMismatch { expected, found } => write!(
                f,
                "snapshot carries {found} metric slots, store expects {expected}"
            ),
        }
    }
}

impl Error for StoreError {}

/// A sampling attempt that failed. The scheduler flag is left untouched
/// so the next tick retries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickError {
    /// A getter failed while capturing the snapshot.
    Sample(SampleError),
    /// The captured snapshot could not be stored.
    Store(StoreError),
}

impl fmt::Display for TickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sample(e) => write!(f, "sampling failed: {e}"),
            Self::Store(e) => write!(f, "store rejected snapshot: {e}"),
        }
    }
}

impl Error for TickError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sample(e) => Some(e),
            Self::Store(e) => Some(e),
        }
    }
}

impl From<SampleError> for TickError {
    fn from(e: SampleError) -> Self {
        Self::Sample(e)
    }
}

impl From<StoreError> for TickError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}
