//! Saturating calendar arithmetic.
//!
//! Every additive operation on dates in the workspace goes through these
//! helpers. Results that would fall past the representable range clamp to
//! [`NaiveDateTime::MAX`] (or [`NaiveDateTime::MIN`] when moving backwards)
//! instead of panicking or wrapping.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

/// Midnight at the start of `date`.
pub fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Whether `dt` falls exactly on midnight.
pub fn is_midnight(dt: NaiveDateTime) -> bool {
    dt.time() == NaiveTime::MIN
}

/// Add `days` (may be negative), saturating at the representable range.
pub fn add_days(dt: NaiveDateTime, days: i64) -> NaiveDateTime {
    TimeDelta::try_days(days)
        .and_then(|d| dt.checked_add_signed(d))
        .unwrap_or(if days < 0 {
            NaiveDateTime::MIN
        } else {
            NaiveDateTime::MAX
        })
}

/// Add `hours` (may be negative), saturating at the representable range.
pub fn add_hours(dt: NaiveDateTime, hours: i64) -> NaiveDateTime {
    TimeDelta::try_hours(hours)
        .and_then(|d| dt.checked_add_signed(d))
        .unwrap_or(if hours < 0 {
            NaiveDateTime::MIN
        } else {
            NaiveDateTime::MAX
        })
}

/// Add `months`, saturating at [`NaiveDateTime::MAX`].
///
/// Day-of-month is clamped by chrono when the target month is shorter.
pub fn add_months(dt: NaiveDateTime, months: u32) -> NaiveDateTime {
    dt.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDateTime::MAX)
}

/// Midnight on January 1st of `year`, clamped to the representable range.
pub fn year_start(year: i64) -> NaiveDateTime {
    let clamped = year.clamp(
        NaiveDate::MIN.year() as i64 + 1,
        NaiveDate::MAX.year() as i64,
    );
    match NaiveDate::from_ymd_opt(clamped as i32, 1, 1) {
        Some(date) => midnight(date),
        None if year < 0 => NaiveDateTime::MIN,
        None => NaiveDateTime::MAX,
    }
}

/// Midnight on the first day of the month containing `dt`.
pub fn month_start(dt: NaiveDateTime) -> NaiveDateTime {
    // Day 1 of any existing month is always representable.
    midnight(dt.date().with_day(1).unwrap_or(dt.date()))
}

/// Midnight on the first day of the month after the one containing `dt`.
pub fn next_month_start(dt: NaiveDateTime) -> NaiveDateTime {
    add_months(month_start(dt), 1)
}

/// Whole months from the month of `from` to the month of `to`.
pub fn months_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    let a = from.year() as i64 * 12 + from.month0() as i64;
    let b = to.year() as i64 * 12 + to.month0() as i64;
    b - a
}

/// Seconds since the Unix epoch, treating `dt` as UTC.
pub fn to_seconds(dt: NaiveDateTime) -> i64 {
    dt.and_utc().timestamp()
}

/// Inverse of [`to_seconds`], saturating at the representable range.
pub fn from_seconds(secs: i64) -> NaiveDateTime {
    match DateTime::from_timestamp(secs, 0) {
        Some(dt) => dt.naive_utc(),
        None if secs < 0 => NaiveDateTime::MIN,
        None => NaiveDateTime::MAX,
    }
}
