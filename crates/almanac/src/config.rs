//! Session configuration and validation.
//!
//! [`SessionConfig`] is checked once by
//! [`Session::start`](crate::Session::start); every limit it carries is
//! fixed for the life of the session.

use std::error::Error;
use std::fmt;

use almanac_render::RenderConfig;
use almanac_store::SamplingMode;

/// Default upper bound on the record bytes of one archive block.
pub const DEFAULT_MAX_BLOCK_BYTES: usize = 64 * 1024;

/// Smallest accepted `max_block_bytes`.
pub const MIN_BLOCK_BYTES: usize = 1024;

/// Everything a [`Session`](crate::Session) needs besides its catalog.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionConfig {
    /// When samples are taken. Default: [`SamplingMode::Monthly`].
    pub sampling: SamplingMode,
    /// Rendering limits and plot geometry. Default: [`RenderConfig::default`].
    pub render: RenderConfig,
    /// Upper bound on the record bytes of one archive block. Default:
    /// 65 536. Minimum: 1 024.
    pub max_block_bytes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingMode::default(),
            render: RenderConfig::default(),
            max_block_bytes: DEFAULT_MAX_BLOCK_BYTES,
        }
    }
}

impl SessionConfig {
    /// Check every limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.render.validate()?;
        if self.max_block_bytes < MIN_BLOCK_BYTES {
            return Err(ConfigError::BlockTooSmall {
                configured: self.max_block_bytes,
            });
        }
        Ok(())
    }
}

/// Errors detected by [`SessionConfig::validate`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// The rendering limits are invalid.
    Render(almanac_render::ConfigError),
    /// `max_block_bytes` is below the minimum of 1 024.
    BlockTooSmall {
        /// The configured value.
        configured: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render(e) => write!(f, "render: {e}"),
            Self::BlockTooSmall { configured } => {
                write!(
                    f,
                    "max_block_bytes {configured} is below minimum of {MIN_BLOCK_BYTES}"
                )
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Render(e) => Some(e),
            Self::BlockTooSmall { .. } => None,
        }
    }
}

impl From<almanac_render::ConfigError> for ConfigError {
    fn from(e: almanac_render::ConfigError) -> Self {
        Self::Render(e)
    }
}
