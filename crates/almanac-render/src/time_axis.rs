//! Calendar-aware time axis scaling.
//!
//! Ranges of sixteen days or more are aligned to month boundaries; shorter
//! ranges are aligned to whole days. The step is then read from a fixed
//! granularity table rather than derived, because month and year lengths
//! vary:
//!
//! | aligned span          | step        |
//! |-----------------------|-------------|
//! | 60 months or more     | years (shared increment algorithm) |
//! | 46 months or more     | 6 months    |
//! | 24 months or more     | 3 months    |
//! | 13 months or more     | 2 months    |
//! | 5 months or more      | 1 month     |
//! | 50 days or more       | 10 days     |
//! | 25 days or more       | 5 days      |
//! | 10 days or more       | 2 days      |
//! | 5 days or more        | 1 day       |
//! | 2.5 days or more      | 12 hours    |
//! | 1.25 days or more     | 6 hours     |
//! | shorter               | 2 hours     |
//!
//! All stepping saturates at [`NaiveDateTime::MAX`].

use almanac_core::calendar::{
    add_days, add_hours, add_months, from_seconds, is_midnight, midnight, month_start,
    months_between, next_month_start, to_seconds, year_start,
};
use chrono::{Datelike, NaiveDateTime};

use crate::axis::{nice_increment, AxisTick};
use crate::format::format_time;

const SECONDS_PER_DAY: f64 = 86_400.0;
const MONTH_ALIGN_DAYS: f64 = 16.0;
// Far above anything the granularity table produces; bounds saturated loops.
const MAX_TICKS: usize = 1_000;

/// Distance between time-axis gridlines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeStep {
    /// Whole calendar years.
    Years(u32),
    /// Whole calendar months.
    Months(u32),
    /// Whole days.
    Days(u32),
    /// Whole hours.
    Hours(u32),
}

impl TimeStep {
    /// `from` advanced by `n` steps, saturating.
    pub fn advance(self, from: NaiveDateTime, n: u32) -> NaiveDateTime {
        match self {
            Self::Years(k) => match k.checked_mul(n).and_then(|y| y.checked_mul(12)) {
                Some(months) => add_months(from, months),
                None => NaiveDateTime::MAX,
            },
            Self::Months(k) => match k.checked_mul(n) {
                Some(months) => add_months(from, months),
                None => NaiveDateTime::MAX,
            },
            Self::Days(k) => add_days(from, k as i64 * n as i64),
            Self::Hours(k) => add_hours(from, k as i64 * n as i64),
        }
    }
}

/// A time axis: gridlines from `start` to `end` every `step`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeScale {
    /// First gridline.
    pub start: NaiveDateTime,
    /// Last gridline.
    pub end: NaiveDateTime,
    /// Granularity and increment.
    pub step: TimeStep,
}

impl TimeScale {
    /// Fit an axis to the data range `first..=last` (swapped if reversed).
    pub fn fit(first: NaiveDateTime, last: NaiveDateTime) -> Self {
        let (first, last) = if last < first { (last, first) } else { (first, last) };
        let span_days = days_between(first, last);

        let (start, end) = if span_days >= MONTH_ALIGN_DAYS {
            let end = if last.day() == 1 && is_midnight(last) {
                last
            } else {
                next_month_start(last)
            };
            (month_start(first), end)
        } else {
            let start = midnight(first.date());
            let end = if is_midnight(last) && last > start {
                last
            } else {
                add_days(midnight(last.date()), 1)
            };
            (start, end)
        };

        let aligned_to_month = span_days >= MONTH_ALIGN_DAYS;
        let months = months_between(start, end);
        if aligned_to_month && months >= 60 {
            return Self::yearly(start, end);
        }

        let days = days_between(start, end);
        let step = if aligned_to_month && months >= 46 {
            TimeStep::Months(6)
        } else if aligned_to_month && months >= 24 {
            TimeStep::Months(3)
        } else if aligned_to_month && months >= 13 {
            TimeStep::Months(2)
        } else if aligned_to_month && months >= 5 {
            TimeStep::Months(1)
        } else if days >= 50.0 {
            TimeStep::Days(10)
        } else if days >= 25.0 {
            TimeStep::Days(5)
        } else if days >= 10.0 {
            TimeStep::Days(2)
        } else if days >= 5.0 {
            TimeStep::Days(1)
        } else if days >= 2.5 {
            TimeStep::Hours(12)
        } else if days >= 1.25 {
            TimeStep::Hours(6)
        } else {
            TimeStep::Hours(2)
        };

        Self {
            start,
            end: snap_end(start, end, step),
            step,
        }
    }

    fn yearly(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        let first_year = start.year() as f64;
        let last_year = if end.month() == 1 && end.day() == 1 && is_midnight(end) {
            end.year() as f64
        } else {
            end.year() as f64 + 1.0
        };
        let years = nice_increment(first_year, last_year);
        let step = TimeStep::Years(years.increment.clamp(1.0, u32::MAX as f64) as u32);
        // Past the last representable year the axis ends at the data's end.
        Self {
            start: year_start(years.start as i64),
            end: year_start(years.end as i64).max(end),
            step,
        }
    }

    /// Gridline timestamps from `start` through `end`.
    pub fn tick_times(&self) -> Vec<NaiveDateTime> {
        let mut times = Vec::new();
        for n in 0..MAX_TICKS as u32 {
            let t = self.step.advance(self.start, n);
            if t > self.end || times.last() == Some(&t) {
                break;
            }
            times.push(t);
            if t == self.end {
                break;
            }
        }
        times
    }

    /// Number of intervals between gridlines.
    pub fn intervals(&self) -> usize {
        self.tick_times().len().saturating_sub(1)
    }

    /// Labelled gridlines, positioned as fractions of the axis.
    pub fn ticks(&self) -> Vec<AxisTick<NaiveDateTime>> {
        self.tick_times()
            .into_iter()
            .map(|t| AxisTick {
                value: t,
                position: self.fraction(t),
                label: format_time(t, self.step),
            })
            .collect()
    }

    /// Fraction of the axis at which `t` lies, computed in whole seconds.
    pub fn fraction(&self, t: NaiveDateTime) -> f64 {
        let origin = to_seconds(self.start);
        let span = to_seconds(self.end) - origin;
        if span > 0 {
            (to_seconds(t) - origin) as f64 / span as f64
        } else {
            0.0
        }
    }

    /// Inverse of [`TimeScale::fraction`], rounded to the nearest second.
    pub fn time_at(&self, fraction: f64) -> NaiveDateTime {
        let origin = to_seconds(self.start);
        let span = (to_seconds(self.end) - origin) as f64;
        let offset = (fraction * span).round();
        if !offset.is_finite() {
            return if offset < 0.0 { self.start } else { self.end };
        }
        from_seconds(origin.saturating_add(offset as i64))
    }
}

fn days_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to_seconds(to) - to_seconds(from)) as f64 / SECONDS_PER_DAY
}

/// Smallest whole number of steps from `start` reaching `end`.
fn snap_end(start: NaiveDateTime, end: NaiveDateTime, step: TimeStep) -> NaiveDateTime {
    let mut t = start;
    for n in 1..=MAX_TICKS as u32 {
        if t >= end {
            break;
        }
        t = step.advance(start, n);
    }
    t.max(end)
}
