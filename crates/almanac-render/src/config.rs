//! Chart rendering configuration.

use crate::downsample::MAX_POINTS;
use crate::error::ConfigError;
use crate::layout::PlotRect;

/// Default maximum number of simultaneously selected metrics.
pub const DEFAULT_MAX_SELECTED: usize = 10;

const MAX_SELECTED_LIMIT: usize = 64;

/// Limits and geometry for [`render`](crate::render()).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderConfig {
    /// Cap on points per curve. Default: 300. Minimum: 2.
    pub max_points: usize,
    /// Cap on selected metrics. Default: 10. Range: `1..=64`.
    pub max_selected: usize,
    /// Plot area in normalized coordinates. Default: the unit square.
    pub plot: PlotRect,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_points: MAX_POINTS,
            max_selected: DEFAULT_MAX_SELECTED,
            plot: PlotRect::default(),
        }
    }
}

impl RenderConfig {
    /// Check every limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_points < 2 {
            return Err(ConfigError::MaxPointsTooSmall {
                configured: self.max_points,
            });
        }
        if !(1..=MAX_SELECTED_LIMIT).contains(&self.max_selected) {
            return Err(ConfigError::MaxSelectedOutOfRange {
                configured: self.max_selected,
            });
        }
        let PlotRect {
            x_min,
            y_min,
            width,
            height,
        } = self.plot;
        let finite = x_min.is_finite() && y_min.is_finite();
        let sized = width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0;
        if !(finite && sized) {
            return Err(ConfigError::InvalidPlotRect { width, height });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = RenderConfig::default();
        assert_eq!(config.max_points, 300);
        assert_eq!(config.max_selected, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_limits() {
        let config = RenderConfig {
            max_points: 1,
            ..RenderConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::MaxPointsTooSmall { configured: 1 })
        );

        let config = RenderConfig {
            max_selected: 0,
            ..RenderConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MaxSelectedOutOfRange { configured: 0 })
        ));
    }

    #[test]
    fn rejects_degenerate_plot() {
        let config = RenderConfig {
            plot: PlotRect {
                width: 0.0,
                ..PlotRect::default()
            },
            ..RenderConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPlotRect { .. })
        ));
    }
}
