//! Dated snapshots of every tracked metric.

use chrono::NaiveDateTime;
use log::debug;

use crate::catalog::MetricCatalog;
use crate::error::SampleError;
use crate::id::MetricId;

/// One immutable dated record holding a value (possibly absent) for every
/// metric in the catalog.
///
/// `values[n]` belongs to `MetricId(n)`. The length equals the catalog
/// length at capture time; there are no extra keys.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    timestamp: NaiveDateTime,
    values: Box<[Option<f64>]>,
}

impl Snapshot {
    /// Build a snapshot from explicit values in catalog order.
    pub fn new(timestamp: NaiveDateTime, values: Vec<Option<f64>>) -> Self {
        Self {
            timestamp,
            values: values.into_boxed_slice(),
        }
    }

    /// Evaluate every getter in `catalog` and date the result `timestamp`.
    ///
    /// Unavailable metrics and non-finite readings are recorded as absent.
    /// The first getter error aborts the capture; nothing partial escapes.
    pub fn capture(
        timestamp: NaiveDateTime,
        catalog: &dyn MetricCatalog,
    ) -> Result<Self, SampleError> {
        let mut values = Vec::with_capacity(catalog.len());
        for id in catalog.ids() {
            if !catalog.is_available(id) {
                values.push(None);
                continue;
            }
            let value = match catalog.sample(id)? {
                Some(v) if v.is_finite() => Some(v),
                Some(v) => {
                    debug!("metric {id} produced non-finite value {v}; recorded as absent");
                    None
                }
                None => None,
            };
            values.push(value);
        }
        Ok(Self::new(timestamp, values))
    }

    /// The date this snapshot was taken for.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Value of `id`, or `None` when absent or out of range.
    pub fn value(&self, id: MetricId) -> Option<f64> {
        self.values.get(id.index()).copied().flatten()
    }

    /// All values in catalog order.
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Number of metric slots (present or absent).
    pub fn metric_count(&self) -> usize {
        self.values.len()
    }
}
