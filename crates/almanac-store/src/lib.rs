//! Snapshot storage and sampling for almanac.
//!
//! [`SnapshotStore`] is an ordered, date-unique time series behind a single
//! mutex. All access goes through a [`StoreGuard`], so no caller can read
//! or mutate the underlying sequence without holding the lock.
//! [`Scheduler`] is the single writer: once per simulation step it decides
//! whether "now" is a sampling boundary and, if so, captures a snapshot
//! exactly once per boundary.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod scheduler;
pub mod store;

pub use error::{StoreError, TickError};
pub use scheduler::{SamplingMode, Scheduler, TickOutcome};
pub use store::{InsertOutcome, SnapshotStore, StoreGuard, WritePolicy};
