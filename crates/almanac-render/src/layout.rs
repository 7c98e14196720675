//! Mapping downsampled points into normalized plot coordinates and back.
//!
//! [`PlotFrame::project`] and [`PlotFrame::unproject`] are the only two
//! coordinate transforms. Curve layout uses the forward one; tooltip
//! hit-testing runs the forward one over candidate points and picks the
//! nearest, so both always agree.
//!
//! Coordinates follow the rasterizer's pixel-centre convention: a fraction
//! `f` of the axis maps to `-0.5 + min + f * size`.

use almanac_core::MetricId;
use chrono::NaiveDateTime;

use crate::axis::ValueScale;
use crate::downsample::DownsampledSeries;
use crate::time_axis::TimeScale;

/// The plot area within the normalized output space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotRect {
    /// Left edge.
    pub x_min: f64,
    /// Bottom edge.
    pub y_min: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Default for PlotRect {
    fn default() -> Self {
        Self {
            x_min: 0.0,
            y_min: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }
}

impl PlotRect {
    /// Horizontal coordinate at `fraction` of the width.
    pub fn x_at(&self, fraction: f64) -> f64 {
        -0.5 + self.x_min + self.width * fraction
    }

    /// Vertical coordinate at `fraction` of the height.
    pub fn y_at(&self, fraction: f64) -> f64 {
        -0.5 + self.y_min + self.height * fraction
    }

    /// Inverse of [`PlotRect::x_at`].
    pub fn x_fraction(&self, x: f64) -> f64 {
        (x + 0.5 - self.x_min) / self.width
    }

    /// Inverse of [`PlotRect::y_at`].
    pub fn y_fraction(&self, y: f64) -> f64 {
        (y + 0.5 - self.y_min) / self.height
    }
}

/// A point in plot coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotPoint {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl PlotPoint {
    fn distance_sq(self, other: PlotPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Both axes and the plot area: everything the coordinate transforms need.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotFrame {
    /// Time axis (horizontal).
    pub time: TimeScale,
    /// Value axis (vertical).
    pub value: ValueScale,
    /// Plot area.
    pub rect: PlotRect,
}

impl PlotFrame {
    /// Forward mapping from data space to plot coordinates.
    pub fn project(&self, timestamp: NaiveDateTime, value: f64) -> PlotPoint {
        PlotPoint {
            x: self.rect.x_at(self.time.fraction(timestamp)),
            y: self.rect.y_at(self.value.fraction(value)),
        }
    }

    /// Inverse mapping from plot coordinates to data space.
    pub fn unproject(&self, point: PlotPoint) -> (NaiveDateTime, f64) {
        (
            self.time.time_at(self.rect.x_fraction(point.x)),
            self.value.value_at(self.rect.y_fraction(point.y)),
        )
    }
}

/// A maximal stretch of consecutive present points.
#[derive(Clone, Debug, PartialEq)]
pub struct Run {
    /// Index of the first point within the series.
    pub start: usize,
    /// Projected points, in order.
    pub points: Vec<PlotPoint>,
}

/// One curve laid out for drawing.
///
/// Runs of two or more points are polylines; a run of one is an isolated
/// marker. Absent values separate runs and draw nothing.
#[derive(Clone, Debug, PartialEq)]
pub struct CurveLayout {
    /// Metric the curve belongs to.
    pub metric: MetricId,
    /// Runs in time order.
    pub runs: Vec<Run>,
}

impl CurveLayout {
    /// Every connecting segment.
    pub fn segments(&self) -> impl Iterator<Item = (PlotPoint, PlotPoint)> + '_ {
        self.runs
            .iter()
            .flat_map(|run| run.points.windows(2).map(|w| (w[0], w[1])))
    }

    /// Every isolated point.
    pub fn markers(&self) -> impl Iterator<Item = PlotPoint> + '_ {
        self.runs
            .iter()
            .filter(|run| run.points.len() == 1)
            .map(|run| run.points[0])
    }
}

/// Lay out one downsampled series within `frame`.
pub fn layout_curve(series: &DownsampledSeries, frame: &PlotFrame) -> CurveLayout {
    let mut runs: Vec<Run> = Vec::new();
    let mut current: Option<Run> = None;
    for (i, point) in series.points.iter().enumerate() {
        match point.value {
            Some(v) => current
                .get_or_insert_with(|| Run {
                    start: i,
                    points: Vec::new(),
                })
                .points
                .push(frame.project(point.timestamp, v)),
            None => runs.extend(current.take()),
        }
    }
    runs.extend(current);
    CurveLayout {
        metric: series.metric,
        runs,
    }
}

/// The point under a cursor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitTest {
    /// Metric of the curve that was hit.
    pub metric: MetricId,
    /// Index of the point within its series.
    pub index: usize,
    /// Timestamp of the point.
    pub timestamp: NaiveDateTime,
    /// Value of the point.
    pub value: f64,
    /// Where the point is drawn.
    pub point: PlotPoint,
}

/// Find the drawn point nearest to `cursor`, if one lies within
/// `tolerance` horizontally.
///
/// Ties in horizontal distance go to the vertically closer point, so the
/// curve under the cursor wins when several share a timestamp.
pub fn hit_test(
    series: &[DownsampledSeries],
    frame: &PlotFrame,
    cursor: PlotPoint,
    tolerance: f64,
) -> Option<HitTest> {
    let mut best: Option<(f64, f64, HitTest)> = None;
    for curve in series {
        for (index, p) in curve.points.iter().enumerate() {
            let Some(value) = p.value else { continue };
            let point = frame.project(p.timestamp, value);
            let dx = (point.x - cursor.x).abs();
            if dx > tolerance {
                continue;
            }
            let dist = point.distance_sq(cursor);
            let closer = best.as_ref().is_none_or(|(bx, bd, _)| {
                dx < *bx || (dx == *bx && dist < *bd)
            });
            if closer {
                let hit = HitTest {
                    metric: curve.metric,
                    index,
                    timestamp: p.timestamp,
                    value,
                    point,
                };
                best = Some((dx, dist, hit));
            }
        }
    }
    best.map(|(_, _, hit)| hit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downsample::SeriesPoint;
    use almanac_test_utils::ymd;
    use chrono::TimeDelta;
    use proptest::prelude::*;

    fn frame() -> PlotFrame {
        PlotFrame {
            time: TimeScale::fit(ymd(2000, 1, 1), ymd(2003, 1, 1)),
            value: ValueScale::fit(0.0, 36.0),
            rect: PlotRect::default(),
        }
    }

    fn series(values: &[Option<f64>]) -> DownsampledSeries {
        DownsampledSeries {
            metric: MetricId(0),
            points: values
                .iter()
                .enumerate()
                .map(|(i, &value)| SeriesPoint {
                    timestamp: almanac_core::calendar::add_months(ymd(2000, 1, 1), i as u32),
                    value,
                })
                .collect(),
        }
    }

    #[test]
    fn axis_corners_map_to_rect_corners() {
        let f = frame();
        let lo = f.project(f.time.start, f.value.start);
        let hi = f.project(f.time.end, f.value.end);
        assert_eq!(lo, PlotPoint { x: -0.5, y: -0.5 });
        assert_eq!(hi, PlotPoint { x: 0.5, y: 0.5 });
    }

    #[test]
    fn custom_rect_offsets_coordinates() {
        let f = PlotFrame {
            rect: PlotRect {
                x_min: 0.1,
                y_min: 0.2,
                width: 0.5,
                height: 0.25,
            },
            ..frame()
        };
        let p = f.project(f.time.end, f.value.start);
        assert!((p.x - 0.1).abs() < 1e-12);
        assert!((p.y - -0.3).abs() < 1e-12);
    }

    #[test]
    fn gaps_split_runs_and_isolated_points_become_markers() {
        let s = series(&[Some(1.0), Some(2.0), None, Some(3.0), None, None, Some(4.0), Some(5.0)]);
        let layout = layout_curve(&s, &frame());
        let starts: Vec<_> = layout.runs.iter().map(|r| (r.start, r.points.len())).collect();
        assert_eq!(starts, vec![(0, 2), (3, 1), (6, 2)]);
        assert_eq!(layout.segments().count(), 2);
        assert_eq!(layout.markers().count(), 1);
    }

    #[test]
    fn all_absent_draws_nothing() {
        let layout = layout_curve(&series(&[None, None]), &frame());
        assert!(layout.runs.is_empty());
    }

    #[test]
    fn hit_test_finds_nearest_present_point() {
        let f = frame();
        let s = series(&[Some(1.0), None, Some(3.0)]);
        let target = f.project(ymd(2000, 3, 1), 3.0);
        let hit = hit_test(std::slice::from_ref(&s), &f, target, 0.01).unwrap();
        assert_eq!(hit.index, 2);
        assert_eq!(hit.value, 3.0);

        // Over the gap nothing is within a tight tolerance.
        let gap = f.project(ymd(2000, 2, 1), 2.0);
        assert!(hit_test(&[s], &f, gap, 0.001).is_none());
    }

    #[test]
    fn hit_test_prefers_curve_under_cursor() {
        let f = frame();
        let low = series(&[Some(1.0)]);
        let mut high = series(&[Some(30.0)]);
        high.metric = MetricId(1);
        let cursor = f.project(ymd(2000, 1, 1), 29.0);
        let hit = hit_test(&[low, high], &f, cursor, 0.05).unwrap();
        assert_eq!(hit.metric, MetricId(1));
    }

    proptest! {
        #[test]
        fn projection_round_trips(offset_hours in 0i64..26_000, value in 0.0f64..36.0) {
            let f = frame();
            let t = ymd(2000, 1, 1) + TimeDelta::hours(offset_hours);
            let (back_t, back_v) = f.unproject(f.project(t, value));
            prop_assert!((back_t - t).num_seconds().abs() <= 1);
            prop_assert!((back_v - value).abs() < 1e-9);
        }
    }
}
