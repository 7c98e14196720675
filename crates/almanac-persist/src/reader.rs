//! Archive reader.
//!
//! [`ArchiveReader`] reads snapshots from any `Read` source. The header is
//! validated on construction; blocks are pulled in one at a time and their
//! records handed out in order. Records that cannot be decoded are logged,
//! counted and stepped over.

use std::io::Read;

use almanac_core::Snapshot;
use log::warn;

use crate::codec::{decode_block, decode_header, decode_record, DecodedRecord};
use crate::error::PersistError;
use crate::types::ArchiveHeader;

/// Reads an archive from a byte stream.
///
/// Generic over `R: Read` so tests can use `&[u8]` and production
/// code can use `BufReader<File>`. After the first error the reader is
/// exhausted and every later call returns `Ok(None)`.
pub struct ArchiveReader<R: Read> {
    reader: R,
    version: u8,
    header: ArchiveHeader,
    block: Vec<u8>,
    offset: usize,
    remaining: u32,
    snapshots_read: usize,
    skipped: usize,
    done: bool,
}

impl<R: Read> ArchiveReader<R> {
    /// Open an archive stream, reading and validating the header.
    pub fn open(mut reader: R) -> Result<Self, PersistError> {
        let (version, header) = decode_header(&mut reader)?;
        Ok(Self {
            reader,
            version,
            header,
            block: Vec::new(),
            offset: 0,
            remaining: 0,
            snapshots_read: 0,
            skipped: 0,
            done: false,
        })
    }

    /// Format version of the stream.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Header of the stream. Version 1 headers are upgraded on read.
    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// Read the next snapshot, or `None` once the stream is exhausted.
    ///
    /// Each returned snapshot carries as many metrics as its record did,
    /// which may be fewer than the header declares.
    pub fn next_snapshot(&mut self) -> Result<Option<Snapshot>, PersistError> {
        if self.done {
            return Ok(None);
        }
        match self.advance() {
            Ok(Some(snapshot)) => {
                self.snapshots_read += 1;
                Ok(Some(snapshot))
            }
            Ok(None) => {
                self.done = true;
                Ok(None)
            }
            Err(e) => {
                self.done = true;
                Err(e)
            }
        }
    }

    fn advance(&mut self) -> Result<Option<Snapshot>, PersistError> {
        loop {
            if self.remaining == 0 {
                if self.offset != self.block.len() {
                    return Err(PersistError::MalformedRecord {
                        detail: format!(
                            "{} trailing bytes after the last record of a block",
                            self.block.len() - self.offset
                        ),
                    });
                }
                match decode_block(&mut self.reader)? {
                    Some((count, bytes)) => {
                        self.remaining = count;
                        self.block = bytes;
                        self.offset = 0;
                        continue;
                    }
                    None => return Ok(None),
                }
            }

            let mut rest = &self.block[self.offset..];
            let before = rest.len();
            let record = decode_record(&mut rest, self.version, &self.header)?;
            self.offset += before - rest.len();
            self.remaining -= 1;

            match record {
                DecodedRecord::Snapshot(snapshot) => return Ok(Some(snapshot)),
                DecodedRecord::Skipped { reason } => {
                    warn!("skipping archive record: {reason}");
                    self.skipped += 1;
                }
            }
        }
    }

    /// Number of snapshots returned so far.
    pub fn snapshots_read(&self) -> usize {
        self.snapshots_read
    }

    /// Number of records skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Convert into a snapshot iterator.
    pub fn snapshots(self) -> SnapshotIter<R> {
        SnapshotIter { reader: self }
    }
}

/// Iterator adapter over archived snapshots.
pub struct SnapshotIter<R: Read> {
    reader: ArchiveReader<R>,
}

impl<R: Read> SnapshotIter<R> {
    /// Number of records skipped so far.
    pub fn skipped(&self) -> usize {
        self.reader.skipped()
    }
}

impl<R: Read> Iterator for SnapshotIter<R> {
    type Item = Result<Snapshot, PersistError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_snapshot().transpose()
    }
}
