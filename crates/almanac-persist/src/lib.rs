//! Versioned binary archive of almanac snapshots.
//!
//! Lets a session's snapshot history outlive the process. Snapshots are
//! encoded with a small custom codec (no serde dependency) and grouped
//! into blocks no larger than a configured byte limit, so a host save
//! system can store them chunk by chunk.
//!
//! # Architecture
//!
//! - [`ArchiveWriter`] streams snapshots to any `Write` sink
//! - [`ArchiveReader`] reads them back from any `Read` source
//! - [`save_store`] and [`load_into`] move a whole [`SnapshotStore`]
//!   without holding its lock during I/O
//!
//! # Format
//!
//! ```text
//! [MAGIC "ALMN"] [VERSION u8] [mode u8] [threshold secs u32]
//! [metric_count u32] [width u8 × metric_count]
//! [Block 1] [Block 2] ... [Block N]
//!
//! Block  = [byte_len u32] [record_count u32] [Record × record_count]
//! Record = [record_len u32] [year month day hour minute second: i32 × 6]
//!          [metric_count u32] ([flag u8] [f32 | f64]) × metric_count
//! ```
//!
//! All integers are little-endian. A record may carry fewer metrics than
//! the header declares; the missing trailing metrics read back as absent.
//!
//! [`SnapshotStore`]: almanac_store::SnapshotStore

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod load;
pub mod reader;
pub mod types;
pub mod writer;

pub use codec::DecodedRecord;
pub use error::PersistError;
pub use load::{load_into, save_store};
pub use reader::{ArchiveReader, SnapshotIter};
pub use types::{ArchiveHeader, LoadReport, SaveReport};
pub use writer::ArchiveWriter;

/// Magic bytes at the start of every archive.
pub const MAGIC: [u8; 4] = *b"ALMN";

/// Current binary format version.
///
/// History:
/// - v1: header carries only the metric count (monthly sampling, every
///   value an f32); records are fixed-size with no length prefix
/// - v2: header adds the sampling mode and per-metric value widths;
///   records are length-prefixed and carry their own metric count
pub const FORMAT_VERSION: u8 = 2;
