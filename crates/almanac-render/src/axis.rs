//! Human-friendly value axis scaling.
//!
//! The increment algorithm in `nice_increment` is shared with the time
//! axis, which runs it over whole years.

use almanac_core::NumberFormat;

use crate::format::{decimals_for, format_value};

/// Fewest intervals the scaler aims for.
pub const MIN_INTERVALS: usize = 5;
/// Most intervals the scaler allows.
pub const MAX_INTERVALS: usize = 15;

const FORCE_ZERO_RATIO: f64 = 0.3;
const SIGNIFICANCE: f64 = 1e-14;
// Powers of ten representable in an f64.
const MAX_WIDENINGS: i32 = 308;
// Doubling or halving converges long before this.
const MAX_ADJUSTMENTS: usize = 64;

/// One labelled tick on an axis.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisTick<T> {
    /// Domain value at the tick.
    pub value: T,
    /// Position along the axis. Fraction of the axis (0 at start, 1 at
    /// end) when produced by a scale, plot coordinates once rendered.
    pub position: f64,
    /// Display text.
    pub label: String,
}

/// `start..=end` stepped by `increment`.
///
/// `start <= min <= max <= end` for the domain it was fitted to, and
/// `end - start` is a whole multiple of `increment`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueScale {
    /// First gridline.
    pub start: f64,
    /// Last gridline.
    pub end: f64,
    /// Distance between gridlines.
    pub increment: f64,
}

impl ValueScale {
    /// Fit a scale to the domain `min..=max`.
    ///
    /// Bounds are swapped if reversed. Non-finite bounds fall back to the
    /// unit domain. Degenerate and near-constant domains are widened rather
    /// than rejected.
    pub fn fit(min: f64, max: f64) -> Self {
        let (mut min, mut max) = if min.is_finite() && max.is_finite() {
            (min.min(max), min.max(max))
        } else {
            (0.0, 1.0)
        };

        if min > 0.0 && min < FORCE_ZERO_RATIO * max {
            min = 0.0;
        }
        if max < 0.0 && max > FORCE_ZERO_RATIO * min {
            max = 0.0;
        }
        if min == max {
            max = min.floor() + 1.0;
        }

        let mut fitted = nice_increment(min, max);
        // Large near-constant values: the +1 above is lost to rounding, or
        // the increment is too small to advance a tick.
        let mut widening = 1;
        while !significant(&fitted) && widening <= MAX_WIDENINGS {
            let span = 10f64.powi(widening);
            let widened = min + span;
            if !widened.is_finite() {
                break;
            }
            fitted = nice_increment(min, widened);
            widening += 1;
        }

        let span = fitted.end - fitted.start;
        fitted.increment = if span == 1.0 {
            0.1
        } else if span == 2.0 {
            0.2
        } else if span == 3.0 {
            0.5
        } else {
            fitted.increment
        };
        fitted
    }

    /// Number of intervals between `start` and `end`.
    pub fn intervals(&self) -> usize {
        intervals(self.start, self.end, self.increment)
    }

    /// Fraction of the axis at which `value` lies.
    pub fn fraction(&self, value: f64) -> f64 {
        let span = self.end - self.start;
        if span > 0.0 {
            (value - self.start) / span
        } else {
            0.0
        }
    }

    /// Inverse of [`ValueScale::fraction`].
    pub fn value_at(&self, fraction: f64) -> f64 {
        self.start + fraction * (self.end - self.start)
    }

    /// Every gridline from `start` to `end`, labelled with `format`.
    pub fn ticks(&self, format: NumberFormat) -> Vec<AxisTick<f64>> {
        let decimals = decimals_for(self.increment);
        (0..=self.intervals())
            .map(|i| {
                // Multiply rather than accumulate to avoid drift.
                let value = self.start + i as f64 * self.increment;
                AxisTick {
                    value,
                    position: self.fraction(value),
                    label: format_value(value, format, decimals),
                }
            })
            .collect()
    }
}

fn significant(scale: &ValueScale) -> bool {
    let magnitude = scale.start.abs().max(scale.end.abs());
    magnitude == 0.0 || scale.increment / magnitude > SIGNIFICANCE
}

fn intervals(start: f64, end: f64, increment: f64) -> usize {
    if increment > 0.0 && end > start {
        ((end - start) / increment).round() as usize
    } else {
        0
    }
}

fn snap(min: f64, max: f64, increment: f64) -> (f64, f64) {
    (
        increment * (min / increment).floor(),
        increment * (max / increment).ceil(),
    )
}

/// Start, end and increment for `min..=max` with whole-number increments.
///
/// The increment starts at the power of ten below half the span (never
/// below one), then doubles while there are more than [`MAX_INTERVALS`]
/// intervals and halves while there are fewer than [`MIN_INTERVALS`] and
/// the increment is even.
pub(crate) fn nice_increment(min: f64, max: f64) -> ValueScale {
    let half_span = 0.5 * (max - min);
    let mut increment = if half_span > 0.0 {
        10f64.powf(half_span.log10().floor()).ceil().max(1.0)
    } else {
        1.0
    };
    let (mut start, mut end) = snap(min, max, increment);

    for _ in 0..MAX_ADJUSTMENTS {
        let n = intervals(start, end, increment);
        if n > MAX_INTERVALS {
            increment *= 2.0;
        } else if n < MIN_INTERVALS && increment % 2.0 == 0.0 {
            increment /= 2.0;
        } else {
            break;
        }
        (start, end) = snap(min, max, increment);
    }

    ValueScale {
        start,
        end,
        increment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn small_positive_minimum_snaps_to_zero() {
        let s = ValueScale::fit(10.0, 100.0);
        assert_eq!(s, ValueScale { start: 0.0, end: 100.0, increment: 10.0 });
        assert_eq!(s.intervals(), 10);
    }

    #[test]
    fn small_negative_maximum_snaps_to_zero() {
        let s = ValueScale::fit(-100.0, -10.0);
        assert_eq!(s.end, 0.0);
        assert_eq!(s.start, -100.0);
    }

    #[test]
    fn halves_even_increment_when_too_few_intervals() {
        let s = ValueScale::fit(0.0, 36.0);
        assert_eq!(s, ValueScale { start: 0.0, end: 40.0, increment: 5.0 });
    }

    #[test]
    fn doubles_increment_when_too_many_intervals() {
        // Half-span 95 gives 10, i.e. 19 intervals; doubling gives 10.
        let s = ValueScale::fit(0.0, 190.0);
        assert_eq!(s.increment, 20.0);
        assert_eq!(s.intervals(), 10);
    }

    #[test]
    fn single_point_widens_to_unit_range() {
        let s = ValueScale::fit(50.0, 50.0);
        assert_eq!(s.start, 50.0);
        assert_eq!(s.end, 51.0);
        assert_eq!(s.increment, 0.1);
        assert_eq!(s.intervals(), 10);
    }

    #[test]
    fn narrow_ranges_use_fractional_increments() {
        assert_eq!(ValueScale::fit(0.0, 2.0).increment, 0.2);
        assert_eq!(ValueScale::fit(0.0, 3.0).increment, 0.5);
    }

    #[test]
    fn huge_constant_series_terminates_with_significant_increment() {
        let s = ValueScale::fit(1e20, 1e20);
        assert!(s.start <= 1e20 && s.end > 1e20);
        assert!(s.increment / s.end > SIGNIFICANCE);
        assert!(s.intervals() <= MAX_INTERVALS);
    }

    #[test]
    fn non_finite_bounds_fall_back() {
        let s = ValueScale::fit(f64::NAN, 3.0);
        assert_eq!((s.start, s.end), (0.0, 1.0));
    }

    #[test]
    fn ticks_cover_scale_with_labels() {
        let s = ValueScale::fit(0.0, 36.0);
        let ticks = s.ticks(NumberFormat::Integer);
        assert_eq!(ticks.len(), 9);
        assert_eq!(ticks[0].position, 0.0);
        assert_eq!(ticks[8].position, 1.0);
        assert_eq!(ticks[3].label, "15");
    }

    #[test]
    fn nice_increment_over_years() {
        let s = nice_increment(1990.0, 2030.0);
        assert_eq!(s, ValueScale { start: 1990.0, end: 2030.0, increment: 5.0 });
    }

    proptest! {
        #[test]
        fn scale_contains_domain(a in -1e6f64..1e6, b in -1e6f64..1e6) {
            let s = ValueScale::fit(a, b);
            prop_assert!(s.start <= a.min(b));
            prop_assert!(s.end >= a.max(b));
            let steps = (s.end - s.start) / s.increment;
            prop_assert!((steps - steps.round()).abs() < 1e-6);
        }

        #[test]
        fn interval_count_is_bounded(a in -1e6f64..1e6, b in -1e6f64..1e6) {
            prop_assume!(a != b);
            let s = ValueScale::fit(a, b);
            let n = s.intervals();
            prop_assert!(n <= MAX_INTERVALS);
            // Below five only when the increment cannot be halved further.
            if s.end - s.start > 3.0 && n < MIN_INTERVALS {
                prop_assert!(s.increment % 2.0 != 0.0);
            }
        }
    }
}
