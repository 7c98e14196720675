//! Choosing which stored snapshots a chart shows.

use almanac_core::calendar::{add_days, midnight, year_start};
use almanac_core::Snapshot;
use almanac_store::SamplingMode;
use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// The user-chosen display mode.
///
/// Bounds are calendar dates. In monthly sampling the UI offers whole
/// years, which map to January 1st of that year (see
/// [`DisplayRange::since_year`] and [`DisplayRange::between_years`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DisplayRange {
    /// Every stored snapshot.
    #[default]
    All,
    /// Snapshots dated on or after the bound.
    Since(NaiveDate),
    /// Snapshots dated within the two bounds (in either order).
    Between(NaiveDate, NaiveDate),
}

impl DisplayRange {
    /// `Since` January 1st of `year`.
    pub fn since_year(year: i32) -> Self {
        Self::Since(year_start(year as i64).date())
    }

    /// `Between` January 1st of `from` and January 1st of `to`.
    pub fn between_years(from: i32, to: i32) -> Self {
        Self::Between(year_start(from as i64).date(), year_start(to as i64).date())
    }
}

/// The calendar unit a degenerate `Between` range is widened by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeUnit {
    /// One calendar year (monthly sampling).
    Year,
    /// One day (sub-daily sampling).
    Day,
}

impl From<SamplingMode> for RangeUnit {
    fn from(mode: SamplingMode) -> Self {
        match mode {
            SamplingMode::Monthly => Self::Year,
            SamplingMode::SubDaily { .. } => Self::Day,
        }
    }
}

/// Inclusive snapshot indices to visualize. Always `first <= last`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeSelection {
    /// Index of the first selected snapshot.
    pub first: usize,
    /// Index of the last selected snapshot.
    pub last: usize,
}

/// Compute the selection for `range` over a sorted snapshot sequence.
///
/// Returns `None` only when `snapshots` is empty; the caller then renders a
/// synthetic "now" point so the axes still have a domain.
pub fn select_range(
    snapshots: &[Snapshot],
    range: DisplayRange,
    unit: RangeUnit,
) -> Option<RangeSelection> {
    let last_index = snapshots.len().checked_sub(1)?;
    let (from, to) = match range {
        DisplayRange::All => return Some(RangeSelection { first: 0, last: last_index }),
        DisplayRange::Since(from) => (midnight(from), NaiveDateTime::MAX),
        DisplayRange::Between(a, b) => bounds(a, b, unit),
    };

    // Nothing on or after `from`: fall back to the newest snapshot.
    let first = snapshots
        .partition_point(|s| s.timestamp() < from)
        .min(last_index);

    let at_or_after_to = snapshots.partition_point(|s| s.timestamp() < to);
    let last = match snapshots.get(at_or_after_to) {
        None => last_index,
        Some(s) if s.timestamp() == to => at_or_after_to,
        Some(_) => at_or_after_to.saturating_sub(1),
    };

    // Cannot happen for sorted input with from <= to, but never trust it.
    let (first, last) = if last < first { (last, first) } else { (first, last) };
    Some(RangeSelection { first, last })
}

/// Order the bounds and widen an empty interval by one unit.
fn bounds(a: NaiveDate, b: NaiveDate, unit: RangeUnit) -> (NaiveDateTime, NaiveDateTime) {
    let (from, to) = if a > b { (b, a) } else { (a, b) };
    let from = midnight(from);
    let mut to = midnight(to);
    if from == to {
        to = match unit {
            RangeUnit::Year if to.year() >= NaiveDate::MAX.year() => NaiveDateTime::MAX,
            RangeUnit::Year => year_start(to.year() as i64 + 1),
            RangeUnit::Day => add_days(to, 1),
        };
    }
    (from, to)
}
