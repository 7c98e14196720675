//! Strongly-typed metric identifier.

use std::fmt;

/// Identifies one tracked quantity in the metric catalog.
///
/// Metrics are registered once when the catalog is built and assigned
/// sequential IDs. `MetricId(n)` corresponds to the n-th entry in catalog
/// declaration order, which is also the order values are laid out in a
/// [`Snapshot`](crate::Snapshot) and in the persisted record format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricId(pub u32);

impl MetricId {
    /// The position of this metric in catalog declaration order.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for MetricId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
