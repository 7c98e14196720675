//! Binary encode/decode for the archive format.
//!
//! All integers are little-endian. Values are written at the width the
//! header declares for their metric, behind a presence flag byte; absent
//! values are written as zero. The format is intentionally simple: no
//! compression, no alignment padding, no self-describing schema.

use std::io::{Read, Write};

use almanac_core::{Snapshot, ValueWidth};
use almanac_store::SamplingMode;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::PersistError;
use crate::types::ArchiveHeader;
use crate::{FORMAT_VERSION, MAGIC};

/// Sampling-mode tag for [`SamplingMode::Monthly`].
pub const MODE_MONTHLY: u8 = 0;
/// Sampling-mode tag for [`SamplingMode::SubDaily`].
pub const MODE_SUB_DAILY: u8 = 1;

const BLOCK_HEADER_BYTES: usize = 8;

// ── Primitive writers ───────────────────────────────────────────

/// Write a single byte.
pub fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), PersistError> {
    w.write_all(&[v])?;
    Ok(())
}

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), PersistError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian i32.
pub fn write_i32_le(w: &mut dyn Write, v: i32) -> Result<(), PersistError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian f32.
pub fn write_f32_le(w: &mut dyn Write, v: f32) -> Result<(), PersistError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian f64.
pub fn write_f64_le(w: &mut dyn Write, v: f64) -> Result<(), PersistError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

/// Read a single byte.
pub fn read_u8(r: &mut dyn Read) -> Result<u8, PersistError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, PersistError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a little-endian i32.
pub fn read_i32_le(r: &mut dyn Read) -> Result<i32, PersistError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

/// Read a little-endian f32.
pub fn read_f32_le(r: &mut dyn Read) -> Result<f32, PersistError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

/// Read a little-endian f64.
pub fn read_f64_le(r: &mut dyn Read) -> Result<f64, PersistError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

// ── Header encode/decode ────────────────────────────────────────

/// Encode the archive header (magic, version, sampling mode, widths).
pub fn encode_header(w: &mut dyn Write, header: &ArchiveHeader) -> Result<(), PersistError> {
    w.write_all(&MAGIC)?;
    write_u8(w, FORMAT_VERSION)?;

    match header.mode {
        SamplingMode::Monthly => {
            write_u8(w, MODE_MONTHLY)?;
            write_u32_le(w, 0)?;
        }
        SamplingMode::SubDaily { threshold } => {
            write_u8(w, MODE_SUB_DAILY)?;
            write_u32_le(w, threshold.num_seconds_from_midnight())?;
        }
    }

    write_u32_le(w, metric_count_u32(header.metric_count())?)?;
    for width in &header.widths {
        write_u8(w, width.bytes() as u8)?;
    }
    Ok(())
}

/// Decode and validate the archive header.
///
/// Returns the format version alongside the header. Version 1 archives
/// carry only a metric count; they were always monthly with 4-byte values.
pub fn decode_header(r: &mut dyn Read) -> Result<(u8, ArchiveHeader), PersistError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(PersistError::InvalidMagic);
    }

    let version = read_u8(r)?;
    match version {
        1 => {
            let count = read_u32_le(r)? as usize;
            let header = ArchiveHeader::new(SamplingMode::Monthly, vec![ValueWidth::Four; count]);
            Ok((version, header))
        }
        FORMAT_VERSION => {
            let tag = read_u8(r)?;
            let threshold_secs = read_u32_le(r)?;
            let mode = match tag {
                MODE_MONTHLY => SamplingMode::Monthly,
                MODE_SUB_DAILY => {
                    let threshold = NaiveTime::from_num_seconds_from_midnight_opt(threshold_secs, 0)
                        .ok_or_else(|| PersistError::MalformedHeader {
                            detail: format!("sampling threshold {threshold_secs}s is past midnight"),
                        })?;
                    SamplingMode::SubDaily { threshold }
                }
                tag => return Err(PersistError::InvalidSamplingMode { tag }),
            };

            let count = read_u32_le(r)? as usize;
            // Grown as read, so a corrupt count cannot force a huge allocation.
            let mut widths = Vec::with_capacity(count.min(4096));
            for _ in 0..count {
                let tag = read_u8(r)?;
                widths.push(ValueWidth::from_bytes(tag).ok_or(PersistError::InvalidWidth { tag })?);
            }
            Ok((version, ArchiveHeader::new(mode, widths)))
        }
        found => Err(PersistError::UnsupportedVersion { found }),
    }
}

fn metric_count_u32(count: usize) -> Result<u32, PersistError> {
    u32::try_from(count).map_err(|_| PersistError::MalformedHeader {
        detail: format!("metric count {count} exceeds u32::MAX"),
    })
}

// ── Block framing ───────────────────────────────────────────────

/// Write a block header followed by its encoded records.
pub fn encode_block(
    w: &mut dyn Write,
    record_count: u32,
    records: &[u8],
) -> Result<(), PersistError> {
    let byte_len = u32::try_from(records.len()).map_err(|_| PersistError::MalformedRecord {
        detail: format!("block of {} bytes exceeds u32::MAX", records.len()),
    })?;
    write_u32_le(w, byte_len)?;
    write_u32_le(w, record_count)?;
    w.write_all(records)?;
    Ok(())
}

/// Read the next block.
///
/// Returns `Ok(None)` on clean EOF (no bytes available), the record count
/// and record bytes on success, or an error on a truncated block.
pub fn decode_block(r: &mut dyn Read) -> Result<Option<(u32, Vec<u8>)>, PersistError> {
    // Read the block header byte-by-byte to distinguish clean EOF
    // (zero bytes available) from truncation.
    let mut head = [0u8; BLOCK_HEADER_BYTES];
    let mut filled = 0;
    while filled < BLOCK_HEADER_BYTES {
        match r.read(&mut head[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(PersistError::MalformedRecord {
                    detail: format!(
                        "truncated block header: got {filled} of {BLOCK_HEADER_BYTES} bytes"
                    ),
                })
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PersistError::Io(e)),
        }
    }
    let byte_len = u32::from_le_bytes([head[0], head[1], head[2], head[3]]) as u64;
    let record_count = u32::from_le_bytes([head[4], head[5], head[6], head[7]]);

    let mut records = Vec::new();
    r.take(byte_len).read_to_end(&mut records)?;
    if records.len() as u64 != byte_len {
        return Err(PersistError::MalformedRecord {
            detail: format!("truncated block: got {} of {byte_len} bytes", records.len()),
        });
    }
    Ok(Some((record_count, records)))
}

// ── Record encode/decode ────────────────────────────────────────

/// A record read back from a block.
#[derive(Clone, Debug, PartialEq)]
pub enum DecodedRecord {
    /// A valid snapshot, carrying as many metrics as the record did.
    Snapshot(Snapshot),
    /// A record that was consumed but could not be turned into a snapshot.
    Skipped {
        /// Why the record was skipped.
        reason: String,
    },
}

/// Encode one snapshot as a current-version record, appending to `buf`.
pub fn encode_record(
    buf: &mut Vec<u8>,
    snapshot: &Snapshot,
    header: &ArchiveHeader,
) -> Result<(), PersistError> {
    if snapshot.metric_count() != header.metric_count() {
        return Err(PersistError::MetricCountMismatch {
            expected: header.metric_count(),
            found: snapshot.metric_count(),
        });
    }

    let mut body = Vec::new();
    for part in timestamp_parts(snapshot.timestamp()) {
        write_i32_le(&mut body, part)?;
    }
    write_u32_le(&mut body, metric_count_u32(snapshot.metric_count())?)?;
    for (value, width) in snapshot.values().iter().zip(&header.widths) {
        write_u8(&mut body, value.is_some() as u8)?;
        let v = value.unwrap_or(0.0);
        match width {
            ValueWidth::Four => write_f32_le(&mut body, v as f32)?,
            ValueWidth::Eight => write_f64_le(&mut body, v)?,
        }
    }

    write_u32_le(buf, body.len() as u32)?;
    buf.extend_from_slice(&body);
    Ok(())
}

/// Decode one record of the given format `version` from a block buffer,
/// advancing the slice past it.
///
/// Errors mean the block itself is corrupt and decoding cannot continue.
/// A record that can be stepped over (bad timestamp, bad presence flag,
/// more metrics than the header declares) comes back as
/// [`DecodedRecord::Skipped`].
pub fn decode_record(
    r: &mut &[u8],
    version: u8,
    header: &ArchiveHeader,
) -> Result<DecodedRecord, PersistError> {
    if version == 1 {
        return decode_fixed_record(r, header);
    }

    let len = read_u32_le(r)? as usize;
    if len > r.len() {
        return Err(PersistError::MalformedRecord {
            detail: format!("record of {len} bytes overruns its block ({} left)", r.len()),
        });
    }
    let block: &[u8] = *r;
    let (mut body, rest) = block.split_at(len);
    *r = rest;

    // Everything inside the length prefix is recoverable.
    match decode_body(&mut body, header) {
        Ok(decoded) => Ok(decoded),
        Err(e) => Ok(DecodedRecord::Skipped {
            reason: e.to_string(),
        }),
    }
}

fn decode_body(body: &mut &[u8], header: &ArchiveHeader) -> Result<DecodedRecord, PersistError> {
    let timestamp = read_timestamp(body)?;
    let count = read_u32_le(body)? as usize;
    if count > header.metric_count() {
        return Ok(DecodedRecord::Skipped {
            reason: format!(
                "record carries {count} metrics, header declares {}",
                header.metric_count()
            ),
        });
    }
    let mut values = Vec::with_capacity(count);
    for width in &header.widths[..count] {
        match read_value(body, *width)? {
            Ok(value) => values.push(value),
            Err(reason) => return Ok(DecodedRecord::Skipped { reason }),
        }
    }
    Ok(finish(timestamp, values))
}

/// Version 1: no length prefix or count; one 4-byte value per header metric.
fn decode_fixed_record(
    r: &mut &[u8],
    header: &ArchiveHeader,
) -> Result<DecodedRecord, PersistError> {
    let timestamp = read_timestamp(r)?;
    let mut values = Vec::with_capacity(header.metric_count());
    let mut bad_flag = None;
    for _ in 0..header.metric_count() {
        // Keep reading past a bad flag so the next record stays aligned.
        match read_value(r, ValueWidth::Four)? {
            Ok(value) => values.push(value),
            Err(reason) => bad_flag = bad_flag.or(Some(reason)),
        }
    }
    match bad_flag {
        Some(reason) => Ok(DecodedRecord::Skipped { reason }),
        None => Ok(finish(timestamp, values)),
    }
}

fn finish(timestamp: Result<NaiveDateTime, String>, values: Vec<Option<f64>>) -> DecodedRecord {
    match timestamp {
        Ok(timestamp) => DecodedRecord::Snapshot(Snapshot::new(timestamp, values)),
        Err(reason) => DecodedRecord::Skipped { reason },
    }
}

fn read_value(
    r: &mut &[u8],
    width: ValueWidth,
) -> Result<Result<Option<f64>, String>, PersistError> {
    let flag = read_u8(r)?;
    let value = match width {
        ValueWidth::Four => read_f32_le(r)? as f64,
        ValueWidth::Eight => read_f64_le(r)?,
    };
    Ok(match flag {
        0 => Ok(None),
        // Non-finite values are never captured; treat them as absent.
        1 => Ok(value.is_finite().then_some(value)),
        flag => Err(format!("invalid presence flag {flag}")),
    })
}

fn timestamp_parts(dt: NaiveDateTime) -> [i32; 6] {
    [
        dt.year(),
        dt.month() as i32,
        dt.day() as i32,
        dt.hour() as i32,
        dt.minute() as i32,
        dt.second() as i32,
    ]
}

fn read_timestamp(r: &mut &[u8]) -> Result<Result<NaiveDateTime, String>, PersistError> {
    let mut parts = [0i32; 6];
    for part in &mut parts {
        *part = read_i32_le(r)?;
    }
    let [year, month, day, hour, minute, second] = parts;
    let unsigned = |v: i32| u32::try_from(v).ok();
    let date = unsigned(month)
        .zip(unsigned(day))
        .and_then(|(m, d)| NaiveDate::from_ymd_opt(year, m, d));
    let time = unsigned(hour)
        .zip(unsigned(minute))
        .zip(unsigned(second))
        .and_then(|((h, m), s)| NaiveTime::from_hms_opt(h, m, s));
    Ok(match date.zip(time) {
        Some((date, time)) => Ok(date.and_time(time)),
        None => Err(format!(
            "invalid timestamp {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use almanac_test_utils::{at, ymd};

    fn header(widths: Vec<ValueWidth>) -> ArchiveHeader {
        ArchiveHeader::new(SamplingMode::Monthly, widths)
    }

    #[test]
    fn header_roundtrip_both_modes() {
        for mode in [SamplingMode::Monthly, SamplingMode::sub_daily_noon()] {
            let h = ArchiveHeader::new(mode, vec![ValueWidth::Four, ValueWidth::Eight]);
            let mut buf = Vec::new();
            encode_header(&mut buf, &h).unwrap();
            let (version, decoded) = decode_header(&mut buf.as_slice()).unwrap();
            assert_eq!(version, FORMAT_VERSION);
            assert_eq!(decoded, h);
        }
    }

    #[test]
    fn bad_width_and_mode_tags() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&[FORMAT_VERSION, 7, 0, 0, 0, 0]);
        assert!(matches!(
            decode_header(&mut buf.as_slice()),
            Err(PersistError::InvalidSamplingMode { tag: 7 })
        ));

        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&[FORMAT_VERSION, MODE_MONTHLY, 0, 0, 0, 0, 1, 0, 0, 0, 5]);
        assert!(matches!(
            decode_header(&mut buf.as_slice()),
            Err(PersistError::InvalidWidth { tag: 5 })
        ));
    }

    #[test]
    fn unknown_version_rejected() {
        let mut buf = MAGIC.to_vec();
        buf.push(9);
        assert!(matches!(
            decode_header(&mut buf.as_slice()),
            Err(PersistError::UnsupportedVersion { found: 9 })
        ));
    }

    #[test]
    fn record_roundtrip_respects_widths() {
        let h = header(vec![ValueWidth::Four, ValueWidth::Eight, ValueWidth::Four]);
        let snap = Snapshot::new(at(2001, 6, 1, 13), vec![Some(0.1), Some(0.1), None]);
        let mut buf = Vec::new();
        encode_record(&mut buf, &snap, &h).unwrap();
        // len + 6 ts + count + (1+4) + (1+8) + (1+4)
        assert_eq!(buf.len(), 4 + 24 + 4 + 5 + 9 + 5);

        let mut slice = buf.as_slice();
        let DecodedRecord::Snapshot(back) = decode_record(&mut slice, FORMAT_VERSION, &h).unwrap()
        else {
            panic!("record skipped");
        };
        assert!(slice.is_empty());
        assert_eq!(back.timestamp(), snap.timestamp());
        assert_eq!(back.values()[0], Some(0.1f32 as f64));
        assert_eq!(back.values()[1], Some(0.1));
        assert_eq!(back.values()[2], None);
    }

    #[test]
    fn mismatched_snapshot_rejected_on_encode() {
        let h = header(vec![ValueWidth::Four]);
        let snap = Snapshot::new(ymd(2000, 1, 1), vec![None, None]);
        let err = encode_record(&mut Vec::new(), &snap, &h).unwrap_err();
        assert!(matches!(err, PersistError::MetricCountMismatch { expected: 1, found: 2 }));
    }

    #[test]
    fn invalid_timestamp_is_skipped_and_stream_stays_aligned() {
        let h = header(vec![ValueWidth::Four]);
        let mut buf = Vec::new();
        encode_record(&mut buf, &Snapshot::new(ymd(2000, 1, 1), vec![Some(1.0)]), &h).unwrap();
        // Month lives at bytes 8..12 (after the length prefix and year).
        buf[8..12].copy_from_slice(&13i32.to_le_bytes());
        encode_record(&mut buf, &Snapshot::new(ymd(2000, 2, 1), vec![Some(2.0)]), &h).unwrap();

        let mut slice = buf.as_slice();
        assert!(matches!(
            decode_record(&mut slice, FORMAT_VERSION, &h).unwrap(),
            DecodedRecord::Skipped { .. }
        ));
        assert!(matches!(
            decode_record(&mut slice, FORMAT_VERSION, &h).unwrap(),
            DecodedRecord::Snapshot(s) if s.timestamp() == ymd(2000, 2, 1)
        ));
    }

    #[test]
    fn record_overrunning_block_is_an_error() {
        let h = header(vec![ValueWidth::Four]);
        let mut buf = Vec::new();
        encode_record(&mut buf, &Snapshot::new(ymd(2000, 1, 1), vec![None]), &h).unwrap();
        buf.truncate(buf.len() - 2);
        let err = decode_record(&mut buf.as_slice(), FORMAT_VERSION, &h).unwrap_err();
        assert!(err.is_truncation());
    }

    #[test]
    fn block_framing_detects_clean_eof_and_truncation() {
        let mut buf = Vec::new();
        encode_block(&mut buf, 2, &[1, 2, 3, 4]).unwrap();
        let mut r = buf.as_slice();
        assert_eq!(decode_block(&mut r).unwrap(), Some((2, vec![1, 2, 3, 4])));
        assert_eq!(decode_block(&mut r).unwrap(), None);

        let mut short = buf[..10].to_vec();
        assert!(decode_block(&mut short.as_slice()).unwrap_err().is_truncation());
        short.truncate(3);
        assert!(decode_block(&mut short.as_slice()).unwrap_err().is_truncation());
    }
}
