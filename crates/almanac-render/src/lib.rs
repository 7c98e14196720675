//! Series rendering for almanac charts.
//!
//! Turns a locked view of the snapshot store into everything an external
//! rasterizer needs to draw a multi-curve line chart:
//!
//! - [`select_range`] picks the first/last snapshot indices for a
//!   [`DisplayRange`].
//! - [`downsample()`] block-averages the selection to at most
//!   [`MAX_POINTS`] points per curve.
//! - [`ValueScale`] and [`TimeScale`] choose human-friendly axis
//!   start/end/increment, sharing one increment algorithm.
//! - [`PlotFrame`] maps points into normalized plot coordinates and back.
//! - [`render()`] runs the whole pass for one [`RenderRequest`].
//!
//! Output coordinates are normalized; nothing here knows about pixels.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod axis;
pub mod config;
pub mod downsample;
pub mod error;
pub mod format;
pub mod layout;
pub mod range;
pub mod render;
pub mod time_axis;

pub use axis::{AxisTick, ValueScale, MAX_INTERVALS, MIN_INTERVALS};
pub use config::{RenderConfig, DEFAULT_MAX_SELECTED};
pub use downsample::{
    downsample, BlockPlan, Downsampled, DownsampledSeries, SeriesPoint, MAX_POINTS,
};
pub use error::{ConfigError, RenderError};
pub use format::{decimals_for, format_time, format_value};
pub use layout::{
    hit_test, layout_curve, CurveLayout, HitTest, PlotFrame, PlotPoint, PlotRect, Run,
};
pub use range::{select_range, DisplayRange, RangeSelection, RangeUnit};
pub use render::{render, RenderOutput, RenderRequest, Selection};
pub use time_axis::{TimeScale, TimeStep};
