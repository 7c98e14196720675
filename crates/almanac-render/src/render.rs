//! One full render pass: select, downsample, scale, lay out.

use almanac_core::{MetricCatalog, MetricId, NumberFormat, Snapshot};
use almanac_store::SnapshotStore;
use chrono::NaiveDateTime;
use log::debug;
use smallvec::SmallVec;

use crate::axis::{AxisTick, ValueScale};
use crate::config::RenderConfig;
use crate::downsample::{downsample, DownsampledSeries};
use crate::error::RenderError;
use crate::layout::{layout_curve, CurveLayout, PlotFrame};
use crate::range::{select_range, DisplayRange, RangeSelection, RangeUnit};
use crate::time_axis::TimeScale;

/// The metrics to draw, in legend order.
pub type Selection = SmallVec<[MetricId; 10]>;

/// What to draw.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderRequest {
    /// Visible date range.
    pub range: DisplayRange,
    /// Selected metrics.
    pub selection: Selection,
}

impl RenderRequest {
    /// A request for `metrics` over `range`.
    pub fn new(range: DisplayRange, metrics: impl IntoIterator<Item = MetricId>) -> Self {
        Self {
            range,
            selection: metrics.into_iter().collect(),
        }
    }
}

/// Everything a rasterizer needs to draw the chart.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOutput {
    /// Snapshot indices shown, or `None` if the store was empty and a
    /// synthetic point at "now" stood in.
    pub selection: Option<RangeSelection>,
    /// Axes and plot area used for every coordinate below.
    pub frame: PlotFrame,
    /// Time gridlines, positioned in plot coordinates.
    pub time_ticks: Vec<AxisTick<NaiveDateTime>>,
    /// Value gridlines, positioned in plot coordinates.
    pub value_ticks: Vec<AxisTick<f64>>,
    /// Downsampled data, one series per selected metric.
    pub series: Vec<DownsampledSeries>,
    /// Laid-out curves, parallel to `series`.
    pub curves: Vec<CurveLayout>,
}

impl RenderOutput {
    /// The time axis scale.
    pub fn time_axis(&self) -> &TimeScale {
        &self.frame.time
    }

    /// The value axis scale.
    pub fn value_axis(&self) -> &ValueScale {
        &self.frame.value
    }
}

/// Render `request` against the current content of `store`.
///
/// The store lock is held across range selection and downsampling and
/// released before any scaling or layout. An empty store renders a single
/// point at `now` with every value absent.
pub fn render(
    store: &SnapshotStore,
    request: &RenderRequest,
    config: &RenderConfig,
    unit: RangeUnit,
    catalog: &dyn MetricCatalog,
    now: NaiveDateTime,
) -> Result<RenderOutput, RenderError> {
    validate_selection(&request.selection, config.max_selected, catalog)?;
    let metrics = request.selection.as_slice();

    let (selection, bounds, data) = {
        let guard = store.lock();
        let snapshots = guard.as_slice();
        match select_range(snapshots, request.range, unit) {
            Some(sel) => {
                let picked = &snapshots[sel.first..=sel.last];
                let bounds = (picked[0].timestamp(), picked[picked.len() - 1].timestamp());
                (Some(sel), bounds, downsample(picked, metrics, config.max_points))
            }
            None => {
                let synthetic = [Snapshot::new(now, Vec::new())];
                (None, (now, now), downsample(&synthetic, metrics, config.max_points))
            }
        }
    };
    debug!(
        "render {:?}: {:?} -> {} points x {} series",
        request.range,
        selection,
        data.plan.blocks,
        data.series.len()
    );

    let time = TimeScale::fit(bounds.0, bounds.1);
    let value = match data.value_bounds() {
        Some((lo, hi)) => ValueScale::fit(lo, hi),
        None => ValueScale::fit(0.0, 0.0),
    };
    let frame = PlotFrame {
        time,
        value,
        rect: config.plot,
    };

    let format = metrics
        .first()
        .and_then(|&id| catalog.descriptor(id))
        .map_or(NumberFormat::default(), |d| d.format);

    let time_ticks = time
        .ticks()
        .into_iter()
        .map(|tick| AxisTick {
            position: frame.rect.x_at(tick.position),
            ..tick
        })
        .collect();
    let value_ticks = value
        .ticks(format)
        .into_iter()
        .map(|tick| AxisTick {
            position: frame.rect.y_at(tick.position),
            ..tick
        })
        .collect();
    let curves = data
        .series
        .iter()
        .map(|series| layout_curve(series, &frame))
        .collect();

    Ok(RenderOutput {
        selection,
        frame,
        time_ticks,
        value_ticks,
        series: data.series,
        curves,
    })
}

fn validate_selection(
    selection: &[MetricId],
    maximum: usize,
    catalog: &dyn MetricCatalog,
) -> Result<(), RenderError> {
    if selection.len() > maximum {
        return Err(RenderError::TooManyMetrics {
            selected: selection.len(),
            maximum,
        });
    }
    for (i, &id) in selection.iter().enumerate() {
        if id.index() >= catalog.len() {
            return Err(RenderError::UnknownMetric { id });
        }
        if selection[..i].contains(&id) {
            return Err(RenderError::DuplicateMetric { id });
        }
    }
    Ok(())
}
