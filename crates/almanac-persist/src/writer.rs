//! Archive writer.
//!
//! [`ArchiveWriter`] streams snapshots to any `Write` sink. The header is
//! written immediately on construction; records are buffered into blocks
//! of at most `max_block_bytes` and each block is written once full.

use std::io::Write;

use almanac_core::Snapshot;

use crate::codec::{encode_block, encode_header, encode_record};
use crate::error::PersistError;
use crate::types::ArchiveHeader;

/// Writes an archive to a byte stream.
///
/// Generic over `W: Write` so tests can use `Vec<u8>` and production
/// code can use `BufWriter<File>`. Call [`finish`](ArchiveWriter::finish)
/// to write the last partial block; dropping the writer loses it.
///
/// # Examples
///
/// ```
/// use almanac_core::{Snapshot, ValueWidth};
/// use almanac_persist::{ArchiveHeader, ArchiveReader, ArchiveWriter};
/// use almanac_store::SamplingMode;
/// use chrono::NaiveDate;
///
/// let header = ArchiveHeader::new(SamplingMode::Monthly, vec![ValueWidth::Eight]);
/// let day = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
///
/// let mut writer = ArchiveWriter::new(Vec::new(), &header, 1024).unwrap();
/// writer.write_snapshot(&Snapshot::new(day, vec![Some(2.5)])).unwrap();
/// let buf = writer.finish().unwrap();
///
/// let mut reader = ArchiveReader::open(buf.as_slice()).unwrap();
/// assert_eq!(reader.header(), &header);
/// let snap = reader.next_snapshot().unwrap().unwrap();
/// assert_eq!(snap.values(), &[Some(2.5)]);
/// assert!(reader.next_snapshot().unwrap().is_none());
/// ```
pub struct ArchiveWriter<W: Write> {
    writer: W,
    header: ArchiveHeader,
    max_block_bytes: usize,
    pending: Vec<u8>,
    pending_records: u32,
    record: Vec<u8>,
    records_written: usize,
    blocks_written: usize,
}

impl<W: Write> ArchiveWriter<W> {
    /// Create a new archive writer, immediately writing the header.
    ///
    /// A block's record bytes stay within `max_block_bytes` unless a single
    /// record is larger, in which case it occupies a block alone.
    pub fn new(
        mut writer: W,
        header: &ArchiveHeader,
        max_block_bytes: usize,
    ) -> Result<Self, PersistError> {
        encode_header(&mut writer, header)?;
        Ok(Self {
            writer,
            header: header.clone(),
            max_block_bytes,
            pending: Vec::new(),
            pending_records: 0,
            record: Vec::new(),
            records_written: 0,
            blocks_written: 0,
        })
    }

    /// Append one snapshot, writing out the current block first if the
    /// record would not fit in it.
    pub fn write_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), PersistError> {
        self.record.clear();
        encode_record(&mut self.record, snapshot, &self.header)?;

        let overflows = self.pending.len() + self.record.len() > self.max_block_bytes;
        if overflows {
            self.end_block()?;
        }
        self.pending.extend_from_slice(&self.record);
        self.pending_records += 1;
        self.records_written += 1;
        Ok(())
    }

    /// Write out the current block, if it holds any records.
    pub fn end_block(&mut self) -> Result<(), PersistError> {
        if self.pending_records == 0 {
            return Ok(());
        }
        encode_block(&mut self.writer, self.pending_records, &self.pending)?;
        self.pending.clear();
        self.pending_records = 0;
        self.blocks_written += 1;
        Ok(())
    }

    /// Number of snapshots accepted so far.
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Number of complete blocks written so far.
    pub fn blocks_written(&self) -> usize {
        self.blocks_written
    }

    /// Write the last partial block, flush, and return the sink.
    pub fn finish(mut self) -> Result<W, PersistError> {
        self.end_block()?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}
