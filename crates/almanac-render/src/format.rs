//! Tick label text.

use almanac_core::NumberFormat;
use chrono::NaiveDateTime;

use crate::time_axis::TimeStep;

const MAX_DECIMALS: usize = 9;

/// Decimal places needed to tell ticks `increment` apart.
pub fn decimals_for(increment: f64) -> usize {
    if !increment.is_finite() || increment <= 0.0 || increment >= 1.0 {
        return 0;
    }
    // Tolerance keeps 0.1 at one place despite its binary representation.
    let places = (-increment.log10() - 1e-9).ceil();
    (places.max(0.0) as usize).min(MAX_DECIMALS)
}

/// Label `value` according to a metric's number-format hint.
///
/// `decimals` is the minimum precision the axis needs; formats with their
/// own precision use whichever is larger.
pub fn format_value(value: f64, format: NumberFormat, decimals: usize) -> String {
    // Avoid "-0" labels.
    let value = if value == 0.0 { 0.0 } else { value };
    match format {
        NumberFormat::Integer => format!("{value:.decimals$}"),
        NumberFormat::Fixed(places) => {
            let places = decimals.max(places as usize);
            format!("{value:.places$}")
        }
        NumberFormat::Percent => format!("{value:.decimals$}%"),
        NumberFormat::Compact => compact(value, decimals),
    }
}

fn compact(value: f64, decimals: usize) -> String {
    let magnitude = value.abs();
    let (scaled, suffix) = if magnitude >= 1e9 {
        (value / 1e9, "G")
    } else if magnitude >= 1e6 {
        (value / 1e6, "M")
    } else if magnitude >= 1e3 {
        (value / 1e3, "k")
    } else {
        return format!("{value:.decimals$}");
    };
    let text = format!("{scaled:.1}");
    let text = text.strip_suffix(".0").unwrap_or(&text);
    format!("{text}{suffix}")
}

/// Label a time-axis tick for the given step granularity.
pub fn format_time(timestamp: NaiveDateTime, step: TimeStep) -> String {
    let pattern = match step {
        TimeStep::Years(_) => "%Y",
        TimeStep::Months(_) => "%b %Y",
        TimeStep::Days(_) => "%d %b",
        TimeStep::Hours(_) => "%d %b %H:%M",
    };
    timestamp.format(pattern).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use almanac_test_utils::{at, ymd};

    #[test]
    fn decimals_follow_increment() {
        assert_eq!(decimals_for(5.0), 0);
        assert_eq!(decimals_for(0.1), 1);
        assert_eq!(decimals_for(0.2), 1);
        assert_eq!(decimals_for(0.5), 1);
        assert_eq!(decimals_for(0.05), 2);
        assert_eq!(decimals_for(f64::NAN), 0);
    }

    #[test]
    fn value_formats() {
        assert_eq!(format_value(15.0, NumberFormat::Integer, 0), "15");
        assert_eq!(format_value(50.3, NumberFormat::Integer, 1), "50.3");
        assert_eq!(format_value(2.0, NumberFormat::Fixed(2), 0), "2.00");
        assert_eq!(format_value(12.0, NumberFormat::Percent, 0), "12%");
        assert_eq!(format_value(-0.0, NumberFormat::Integer, 0), "0");
    }

    #[test]
    fn compact_suffixes() {
        assert_eq!(format_value(1500.0, NumberFormat::Compact, 0), "1.5k");
        assert_eq!(format_value(2_000_000.0, NumberFormat::Compact, 0), "2M");
        assert_eq!(format_value(-3.4e9, NumberFormat::Compact, 0), "-3.4G");
        assert_eq!(format_value(999.0, NumberFormat::Compact, 0), "999");
    }

    #[test]
    fn time_labels_by_granularity() {
        let t = at(2003, 7, 4, 18);
        assert_eq!(format_time(t, TimeStep::Years(1)), "2003");
        assert_eq!(format_time(t, TimeStep::Months(3)), "Jul 2003");
        assert_eq!(format_time(ymd(2003, 7, 4), TimeStep::Days(1)), "04 Jul");
        assert_eq!(format_time(t, TimeStep::Hours(6)), "04 Jul 18:00");
    }
}
