//! Session-level error type.

use std::error::Error;
use std::fmt;

use almanac_core::CatalogError;
use almanac_persist::PersistError;

use crate::config::ConfigError;

/// Errors from starting a session or moving its history in and out.
///
/// Per-tick and per-render failures keep their own types
/// ([`TickError`](almanac_store::TickError),
/// [`RenderError`](almanac_render::RenderError)) since callers handle them
/// by retrying on the next cycle.
#[derive(Debug)]
pub enum SessionError {
    /// The configuration failed validation.
    Config(ConfigError),
    /// The metric catalog failed verification; the session is disabled.
    Catalog(CatalogError),
    /// Saving or loading the archive failed.
    Persist(PersistError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Catalog(e) => write!(f, "catalog: {e}"),
            Self::Persist(e) => write!(f, "archive: {e}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Catalog(e) => Some(e),
            Self::Persist(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<CatalogError> for SessionError {
    fn from(e: CatalogError) -> Self {
        Self::Catalog(e)
    }
}

impl From<PersistError> for SessionError {
    fn from(e: PersistError) -> Self {
        Self::Persist(e)
    }
}
