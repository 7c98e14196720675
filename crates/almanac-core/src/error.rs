//! Error types shared across the almanac workspace.
//!
//! Organized by origin: catalog verification (fatal for a session) and
//! sampling (transient, retried on the next boundary).

use std::error::Error;
use std::fmt;

use crate::id::MetricId;

/// Inconsistencies detected by [`verify_catalog`](crate::verify_catalog).
///
/// Any of these disables the session that owns the catalog. The process
/// itself keeps running.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogError {
    /// The catalog declares no metrics at all.
    Empty,
    /// A metric in `0..len()` has no display descriptor.
    MissingDescriptor {
        /// The metric lacking a descriptor.
        id: MetricId,
    },
    /// Two metrics share the same stable key.
    DuplicateKey {
        /// The repeated key.
        key: String,
    },
    /// A metric was registered with an empty key.
    EmptyKey {
        /// The metric with the empty key.
        id: MetricId,
    },
    /// The catalog declares more metrics than a `MetricId` can address.
    TooManyMetrics {
        /// Number of declared metrics.
        count: usize,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "catalog declares no metrics"),
            Self::MissingDescriptor { id } => {
                write!(f, "metric {id} has no display descriptor")
            }
            Self::DuplicateKey { key } => write!(f, "metric key '{key}' registered twice"),
            Self::EmptyKey { id } => write!(f, "metric {id} has an empty key"),
            Self::TooManyMetrics { count } => {
                write!(f, "catalog declares {count} metrics, more than u32::MAX")
            }
        }
    }
}

impl Error for CatalogError {}

/// Errors raised while evaluating metric getters for a snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SampleError {
    /// The id is outside the catalog.
    UnknownMetric {
        /// The requested id.
        id: MetricId,
    },
    /// A getter failed mid-snapshot. The partial snapshot is discarded.
    GetterFailed {
        /// The metric whose getter failed.
        id: MetricId,
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMetric { id } => write!(f, "metric {id} is not in the catalog"),
            Self::GetterFailed { id, reason } => {
                write!(f, "getter for metric {id} failed: {reason}")
            }
        }
    }
}

impl Error for SampleError {}
