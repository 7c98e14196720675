//! Error types for the snapshot archive.

use std::fmt;
use std::io;

use almanac_store::StoreError;

/// Errors that can occur while saving or loading an archive.
#[derive(Debug)]
pub enum PersistError {
    /// An I/O error occurred during read or write.
    Io(io::Error),
    /// The stream does not start with the expected `b"ALMN"` magic bytes.
    InvalidMagic,
    /// The format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the stream.
        found: u8,
    },
    /// The archive header could not be decoded.
    MalformedHeader {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// A block or record could not be decoded (truncated or corrupt data).
    MalformedRecord {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// A value-width tag is neither 4 nor 8.
    InvalidWidth {
        /// The unrecognized tag.
        tag: u8,
    },
    /// A sampling-mode tag is not recognized.
    InvalidSamplingMode {
        /// The unrecognized tag.
        tag: u8,
    },
    /// A snapshot being written does not match the header's metric count.
    MetricCountMismatch {
        /// Metrics declared by the header.
        expected: usize,
        /// Metrics carried by the snapshot.
        found: usize,
    },
    /// The store rejected the loaded snapshots.
    Store(StoreError),
}

impl PersistError {
    /// Whether this error means the stream ended or broke mid-record, as
    /// opposed to a problem with the stream's identity or the destination.
    pub fn is_truncation(&self) -> bool {
        match self {
            Self::Io(e) => e.kind() == io::ErrorKind::UnexpectedEof,
            Self::MalformedRecord { .. } => true,
            _ => false,
        }
    }
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidMagic => write!(f, "invalid magic bytes (expected b\"ALMN\")"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported format version {found}")
            }
            Self::MalformedHeader { detail } => write!(f, "malformed header: {detail}"),
            Self::MalformedRecord { detail } => write!(f, "malformed record: {detail}"),
            Self::InvalidWidth { tag } => write!(f, "invalid value width tag {tag}"),
            Self::InvalidSamplingMode { tag } => write!(f, "invalid sampling mode tag {tag}"),
            Self::MetricCountMismatch { expected, found } => write!(
                f,
                "snapshot carries {found} metrics, archive header declares {expected}"
            ),
            Self::Store(e) => write!(f, "store: {e}"),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PersistError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<StoreError> for PersistError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}
