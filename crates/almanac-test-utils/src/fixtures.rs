//! Date helpers and snapshot sequences for tests.

use almanac_core::calendar::{add_days, add_months, midnight};
use almanac_core::Snapshot;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

/// Midnight on the given date. Panics on an invalid date.
pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
    midnight(NaiveDate::from_ymd_opt(y, m, d).expect("valid test date"))
}

/// The given date at `hour`:00. Panics on an invalid date or hour.
pub fn at(y: i32, m: u32, d: u32, hour: u32) -> NaiveDateTime {
    assert!(hour < 24, "hour out of range: {hour}");
    ymd(y, m, d) + TimeDelta::hours(hour as i64)
}

/// `count` snapshots dated to consecutive months starting at `start`.
///
/// `values(i)` supplies the slot values of the i-th snapshot.
pub fn monthly_snapshots(
    start: NaiveDateTime,
    count: usize,
    values: impl Fn(usize) -> Vec<Option<f64>>,
) -> Vec<Snapshot> {
    (0..count)
        .map(|i| Snapshot::new(add_months(start, i as u32), values(i)))
        .collect()
}

/// `count` snapshots dated to consecutive days starting at `start`.
pub fn daily_snapshots(
    start: NaiveDateTime,
    count: usize,
    values: impl Fn(usize) -> Vec<Option<f64>>,
) -> Vec<Snapshot> {
    (0..count)
        .map(|i| Snapshot::new(add_days(start, i as i64), values(i)))
        .collect()
}
