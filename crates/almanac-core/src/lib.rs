//! Core types for the almanac snapshot and charting engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the almanac workspace:
//! metric identifiers, the metric catalog contract, dated snapshots,
//! saturating calendar arithmetic, and core error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod calendar;
pub mod catalog;
pub mod error;
pub mod id;
pub mod snapshot;

pub use catalog::{
    verify_catalog, MetricCatalog, MetricDescriptor, NumberFormat, StaticCatalog,
    StaticCatalogBuilder, ValueWidth,
};
pub use error::{CatalogError, SampleError};
pub use id::MetricId;
pub use snapshot::Snapshot;
