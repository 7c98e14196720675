//! Almanac: dated snapshots of simulation metrics and the charts drawn from them.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! almanac sub-crates and adds the [`Session`] that ties them together. For
//! most users, adding `almanac` as a single dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use almanac::prelude::*;
//! use chrono::NaiveDate;
//!
//! let catalog = StaticCatalog::builder()
//!     .metric(MetricDescriptor::new("population"), || Some(1200.0))
//!     .metric(MetricDescriptor::new("treasury"), || Some(-50.0))
//!     .build()
//!     .unwrap();
//! let mut session = Session::start(SessionConfig::default(), Arc::new(catalog)).unwrap();
//!
//! let day = |m, d| NaiveDate::from_ymd_opt(2000, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! assert!(matches!(session.on_tick(day(1, 1)).unwrap(), TickOutcome::Sampled(_)));
//! assert_eq!(session.on_tick(day(1, 1)).unwrap(), TickOutcome::AlreadySampled);
//!
//! let request = RenderRequest::new(DisplayRange::All, [MetricId(0), MetricId(1)]);
//! let chart = session.render(&request, day(1, 1)).unwrap();
//! assert_eq!(chart.series.len(), 2);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `almanac-core` | Metric ids, the catalog contract, snapshots, calendar helpers |
//! | [`store`] | `almanac-store` | Snapshot store, write policies, the sampling scheduler |
//! | [`chart`] | `almanac-render` | Range selection, downsampling, axis scaling, curve layout |
//! | [`archive`] | `almanac-persist` | Versioned, block-chunked binary archive |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod session;

pub use config::{ConfigError, SessionConfig, DEFAULT_MAX_BLOCK_BYTES, MIN_BLOCK_BYTES};
pub use error::SessionError;
pub use session::{Recorder, Session, Viewer};

/// Core types, traits, and IDs (`almanac-core`).
///
/// Contains the [`types::MetricCatalog`] contract, [`types::Snapshot`] and
/// the saturating date helpers in [`types::calendar`].
pub use almanac_core as types;

/// Snapshot storage and sampling (`almanac-store`).
///
/// [`store::SnapshotStore`] is only reachable through a
/// [`store::StoreGuard`]; [`store::Scheduler`] is its single writer.
pub use almanac_store as store;

/// Chart computation (`almanac-render`).
///
/// [`chart::render()`] runs the whole pass; the pieces
/// ([`chart::select_range`], [`chart::downsample()`], [`chart::ValueScale`],
/// [`chart::TimeScale`], [`chart::hit_test`]) are usable on their own.
pub use almanac_render as chart;

/// Snapshot archives (`almanac-persist`).
///
/// Stream with [`archive::ArchiveWriter`] and [`archive::ArchiveReader`],
/// or move a whole store with [`archive::save_store`] and
/// [`archive::load_into`].
pub use almanac_persist as archive;

/// Common imports for typical almanac usage.
///
/// ```rust
/// use almanac::prelude::*;
/// ```
///
/// This imports the session types, the catalog contract, the render request
/// and output, and the error types a host handles every cycle.
pub mod prelude {
    // Session
    pub use crate::{ConfigError, Recorder, Session, SessionConfig, SessionError, Viewer};

    // Core types and traits
    pub use almanac_core::{
        MetricCatalog, MetricDescriptor, MetricId, NumberFormat, Snapshot, StaticCatalog,
        ValueWidth,
    };

    // Errors
    pub use almanac_core::{CatalogError, SampleError};
    pub use almanac_persist::PersistError;
    pub use almanac_render::RenderError;
    pub use almanac_store::TickError;

    // Store
    pub use almanac_store::{InsertOutcome, SamplingMode, TickOutcome};

    // Chart
    pub use almanac_render::{
        hit_test, AxisTick, CurveLayout, DisplayRange, DownsampledSeries, HitTest, PlotPoint,
        RenderOutput, RenderRequest, TimeScale, TimeStep, ValueScale,
    };

    // Archive
    pub use almanac_persist::{LoadReport, SaveReport};
}
