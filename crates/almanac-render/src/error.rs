//! Error types for chart rendering and its configuration.

use std::error::Error;
use std::fmt;

use almanac_core::MetricId;

/// A render request that cannot be served.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderError {
    /// More metrics are selected than the chart may show.
    TooManyMetrics {
        /// Number of metrics in the request.
        selected: usize,
        /// Configured maximum.
        maximum: usize,
    },
    /// A selected metric is not in the catalog.
    UnknownMetric {
        /// The unknown id.
        id: MetricId,
    },
    /// A metric appears more than once in the selection.
    DuplicateMetric {
        /// The repeated id.
        id: MetricId,
    },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyMetrics { selected, maximum } => {
                write!(f, "{selected} metrics selected, at most {maximum} allowed")
            }
            Self::UnknownMetric { id } => write!(f, "metric {id} is not in the catalog"),
            Self::DuplicateMetric { id } => write!(f, "metric {id} selected more than once"),
        }
    }
}

impl Error for RenderError {}

/// Errors detected by [`RenderConfig::validate()`](crate::RenderConfig::validate).
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// `max_points` is below the minimum of 2.
    MaxPointsTooSmall {
        /// The configured value.
        configured: usize,
    },
    /// `max_selected` is outside `1..=64`.
    MaxSelectedOutOfRange {
        /// The configured value.
        configured: usize,
    },
    /// The plot rectangle has a non-finite origin or a non-positive size.
    InvalidPlotRect {
        /// Configured width.
        width: f64,
        /// Configured height.
        height: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxPointsTooSmall { configured } => {
                write!(f, "max_points {configured} is below minimum of 2")
            }
            Self::MaxSelectedOutOfRange { configured } => {
                write!(f, "max_selected {configured} is outside 1..=64")
            }
            Self::InvalidPlotRect { width, height } => {
                write!(f, "plot rect must be finite with positive size, got {width}x{height}")
            }
        }
    }
}

impl Error for ConfigError {}
