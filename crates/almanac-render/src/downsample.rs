//! Block-averaging a snapshot range into a bounded number of points.
//!
//! A range of `n` snapshots is split into contiguous, non-overlapping
//! blocks of `ceil(n / cap)` snapshots each (the last block may be
//! shorter). Every block becomes one output point: the mean timestamp of
//! its members and, per metric, the mean of its present values. A metric
//! absent from every member of a block yields an absent point, which the
//! curve layout draws as a gap.

use almanac_core::calendar::{from_seconds, to_seconds};
use almanac_core::{MetricId, Snapshot};
use chrono::NaiveDateTime;

/// Default cap on output points per curve.
pub const MAX_POINTS: usize = 300;

/// How a range of `count` snapshots is partitioned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockPlan {
    /// Snapshots per block (the last block may hold fewer).
    pub block_size: usize,
    /// Number of blocks, which is also the number of output points.
    pub blocks: usize,
}

impl BlockPlan {
    /// Partition `count` snapshots into at most `cap` blocks.
    ///
    /// A `cap` of zero is treated as one.
    pub fn new(count: usize, cap: usize) -> Self {
        if count == 0 {
            return Self {
                block_size: 1,
                blocks: 0,
            };
        }
        let block_size = count.div_ceil(cap.max(1));
        Self {
            block_size,
            blocks: count.div_ceil(block_size),
        }
    }
}

/// One averaged point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeriesPoint {
    /// Mean timestamp of the block.
    pub timestamp: NaiveDateTime,
    /// Mean of the present values, or `None` if none were present.
    pub value: Option<f64>,
}

/// The downsampled curve of one selected metric.
#[derive(Clone, Debug, PartialEq)]
pub struct DownsampledSeries {
    /// Metric this curve belongs to.
    pub metric: MetricId,
    /// One point per block, in time order.
    pub points: Vec<SeriesPoint>,
}

impl DownsampledSeries {
    /// Smallest and largest present value, if any.
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        self.points
            .iter()
            .filter_map(|p| p.value)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// The result of one downsampling pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Downsampled {
    /// The partition that was applied.
    pub plan: BlockPlan,
    /// Mean timestamp per block, shared by every series.
    pub timestamps: Vec<NaiveDateTime>,
    /// One curve per requested metric, in request order.
    pub series: Vec<DownsampledSeries>,
}

impl Downsampled {
    /// Smallest and largest present value across every series.
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        self.series
            .iter()
            .filter_map(DownsampledSeries::value_bounds)
            .reduce(|(a_lo, a_hi), (b_lo, b_hi)| (a_lo.min(b_lo), a_hi.max(b_hi)))
    }
}

#[derive(Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: u32,
}

impl Accumulator {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn take(&mut self) -> Option<f64> {
        let mean = (self.count > 0).then(|| self.sum / self.count as f64);
        *self = Self::default();
        mean
    }
}

/// Average `snapshots` into at most `cap` points for each of `metrics`.
///
/// Walks the slice once. Timestamps are summed as epoch seconds in an
/// `i128` so long ranges cannot overflow.
pub fn downsample(snapshots: &[Snapshot], metrics: &[MetricId], cap: usize) -> Downsampled {
    let plan = BlockPlan::new(snapshots.len(), cap);
    let mut timestamps = Vec::with_capacity(plan.blocks);
    let mut series: Vec<DownsampledSeries> = metrics
        .iter()
        .map(|&metric| DownsampledSeries {
            metric,
            points: Vec::with_capacity(plan.blocks),
        })
        .collect();

    let mut accumulators = vec![Accumulator::default(); metrics.len()];
    for block in snapshots.chunks(plan.block_size) {
        let seconds: i128 = block.iter().map(|s| to_seconds(s.timestamp()) as i128).sum();
        let mean = seconds.div_euclid(block.len() as i128);
        let timestamp = from_seconds(mean.clamp(i64::MIN as i128, i64::MAX as i128) as i64);
        timestamps.push(timestamp);

        for snapshot in block {
            for (acc, &metric) in accumulators.iter_mut().zip(metrics) {
                acc.add(snapshot.value(metric));
            }
        }
        for (acc, out) in accumulators.iter_mut().zip(series.iter_mut()) {
            out.points.push(SeriesPoint {
                timestamp,
                value: acc.take(),
            });
        }
    }

    Downsampled {
        plan,
        timestamps,
        series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use almanac_test_utils::{daily_snapshots, monthly_snapshots, ymd};
    use proptest::prelude::*;

    #[test]
    fn short_range_passes_through() {
        let snaps = monthly_snapshots(ymd(2000, 1, 1), 37, |i| vec![Some(i as f64)]);
        let out = downsample(&snaps, &[MetricId(0)], MAX_POINTS);
        assert_eq!(out.plan, BlockPlan { block_size: 1, blocks: 37 });
        assert_eq!(out.timestamps[0], ymd(2000, 1, 1));
        assert_eq!(out.timestamps[36], ymd(2003, 1, 1));
        assert_eq!(out.series[0].points[5].value, Some(5.0));
    }

    #[test]
    fn blocks_average_values_and_timestamps() {
        let snaps = daily_snapshots(ymd(2000, 1, 1), 4, |i| vec![Some(i as f64 * 10.0)]);
        let out = downsample(&snaps, &[MetricId(0)], 2);
        assert_eq!(out.plan, BlockPlan { block_size: 2, blocks: 2 });
        // Jan 1 and Jan 2 average to Jan 1 12:00.
        assert_eq!(out.timestamps[0], ymd(2000, 1, 1) + chrono::TimeDelta::hours(12));
        assert_eq!(out.series[0].points[0].value, Some(5.0));
        assert_eq!(out.series[0].points[1].value, Some(25.0));
    }

    #[test]
    fn absent_values_are_ignored_and_all_absent_blocks_gap() {
        let snaps = daily_snapshots(ymd(2000, 1, 1), 6, |i| match i {
            0 => vec![Some(4.0)],
            1 => vec![None],
            _ => vec![None],
        });
        let out = downsample(&snaps, &[MetricId(0)], 3);
        let values: Vec<_> = out.series[0].points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![Some(4.0), None, None]);
        assert_eq!(out.value_bounds(), Some((4.0, 4.0)));
    }

    #[test]
    fn last_block_may_be_short() {
        let snaps = daily_snapshots(ymd(2000, 1, 1), 601, |_| vec![Some(1.0)]);
        let out = downsample(&snaps, &[MetricId(0)], MAX_POINTS);
        assert_eq!(out.plan, BlockPlan { block_size: 3, blocks: 201 });
        assert_eq!(out.timestamps.last(), Some(&ymd(2001, 8, 23)));
    }

    #[test]
    fn metric_outside_snapshot_width_is_absent() {
        let snaps = daily_snapshots(ymd(2000, 1, 1), 3, |_| vec![Some(1.0)]);
        let out = downsample(&snaps, &[MetricId(0), MetricId(7)], MAX_POINTS);
        assert_eq!(out.series.len(), 2);
        assert!(out.series[1].points.iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn empty_input_yields_no_points() {
        let out = downsample(&[], &[MetricId(0)], MAX_POINTS);
        assert_eq!(out.plan.blocks, 0);
        assert!(out.timestamps.is_empty());
        assert!(out.series[0].points.is_empty());
    }

    proptest! {
        #[test]
        fn plan_partitions_range(count in 1usize..5000, cap in 1usize..400) {
            let plan = BlockPlan::new(count, cap);
            prop_assert!(plan.blocks <= cap);
            prop_assert_eq!(plan.blocks, count.div_ceil(count.div_ceil(cap)));
            // Full blocks before the last, the last covers the remainder.
            let covered = (plan.blocks - 1) * plan.block_size;
            prop_assert!(covered < count);
            prop_assert!(count - covered <= plan.block_size);
        }

        #[test]
        fn timestamps_stay_ordered_and_inside_range(count in 1usize..900, cap in 1usize..50) {
            let snaps = daily_snapshots(ymd(1990, 1, 1), count, |_| vec![None]);
            let out = downsample(&snaps, &[MetricId(0)], cap);
            prop_assert_eq!(out.timestamps.len(), out.plan.blocks);
            prop_assert!(out.timestamps.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(out.timestamps[0] >= snaps[0].timestamp());
            prop_assert!(*out.timestamps.last().unwrap() <= snaps[count - 1].timestamp());
        }
    }
}
