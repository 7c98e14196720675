//! Archive-level behaviour: older versions, truncation, sampling modes and
//! block sizing.

use almanac_core::{Snapshot, ValueWidth};
use almanac_persist::{
    load_into, save_store, ArchiveHeader, ArchiveReader, ArchiveWriter, MAGIC,
};
use almanac_store::{SamplingMode, SnapshotStore};
use almanac_test_utils::{at, daily_snapshots, monthly_snapshots, ymd};
use proptest::prelude::*;

fn v1_record(out: &mut Vec<u8>, date: [i32; 6], values: &[(u8, f32)]) {
    for part in date {
        out.extend_from_slice(&part.to_le_bytes());
    }
    for (flag, value) in values {
        out.push(*flag);
        out.extend_from_slice(&value.to_le_bytes());
    }
}

fn v1_archive(metric_count: u32, records: &[u8], record_count: u32) -> Vec<u8> {
    let mut buf = MAGIC.to_vec();
    buf.push(1);
    buf.extend_from_slice(&metric_count.to_le_bytes());
    buf.extend_from_slice(&(records.len() as u32).to_le_bytes());
    buf.extend_from_slice(&record_count.to_le_bytes());
    buf.extend_from_slice(records);
    buf
}

#[test]
fn version_one_archive_loads_into_wider_store() {
    let mut records = Vec::new();
    v1_record(&mut records, [2000, 1, 1, 0, 0, 0], &[(1, 1.5), (0, 0.0)]);
    v1_record(&mut records, [2000, 2, 1, 0, 0, 0], &[(1, 2.5), (1, 4.0)]);
    let buf = v1_archive(2, &records, 2);

    let store = SnapshotStore::new(3);
    let report = load_into(&store, buf.as_slice()).unwrap();
    assert_eq!(report.version, 1);
    assert_eq!(report.header.mode, SamplingMode::Monthly);
    assert_eq!(report.header.widths, vec![ValueWidth::Four; 2]);
    assert_eq!(report.loaded, 2);

    let guard = store.lock();
    assert_eq!(guard.as_slice()[0].values(), &[Some(1.5), None, None]);
    assert_eq!(guard.as_slice()[1].values(), &[Some(2.5), Some(4.0), None]);
}

#[test]
fn version_one_invalid_date_skipped_without_losing_alignment() {
    let mut records = Vec::new();
    v1_record(&mut records, [2000, 2, 30, 0, 0, 0], &[(1, 1.0)]);
    v1_record(&mut records, [2000, 3, 1, 0, 0, 0], &[(1, 2.0)]);
    let buf = v1_archive(1, &records, 2);

    let store = SnapshotStore::new(1);
    let report = load_into(&store, buf.as_slice()).unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(report.loaded, 1);
    assert_eq!(store.snapshot_at(0).unwrap().timestamp(), ymd(2000, 3, 1));
}

#[test]
fn truncated_tail_keeps_complete_blocks() {
    let source = SnapshotStore::new(1);
    source
        .lock()
        .restore(monthly_snapshots(ymd(2000, 1, 1), 40, |i| vec![Some(i as f64)]))
        .unwrap();
    let header = ArchiveHeader::new(SamplingMode::Monthly, vec![ValueWidth::Four]);
    let mut buf = Vec::new();
    // 37-byte records, three per block.
    let saved = save_store(&source, &header, &mut buf, 111).unwrap();
    assert_eq!(saved.blocks, 14);
    buf.truncate(buf.len() - 10);

    let target = SnapshotStore::new(1);
    let report = load_into(&target, buf.as_slice()).unwrap();
    assert!(report.truncated);
    assert_eq!(report.loaded, 39);
    assert_eq!(target.lock().last().unwrap().timestamp(), ymd(2003, 3, 1));
}

#[test]
fn sub_daily_archive_keeps_hours_and_mode() {
    let mode = SamplingMode::SubDaily {
        threshold: chrono::NaiveTime::from_hms_opt(6, 30, 0).unwrap(),
    };
    let header = ArchiveHeader::new(mode, vec![ValueWidth::Eight]);
    let snaps = vec![
        Snapshot::new(at(2010, 5, 1, 6), vec![Some(1.0)]),
        Snapshot::new(at(2010, 5, 1, 18), vec![Some(2.0)]),
    ];

    let mut writer = ArchiveWriter::new(Vec::new(), &header, 1024).unwrap();
    for s in &snaps {
        writer.write_snapshot(s).unwrap();
    }
    let buf = writer.finish().unwrap();

    let reader = ArchiveReader::open(buf.as_slice()).unwrap();
    assert_eq!(reader.header().mode, mode);
    let back: Vec<_> = reader.snapshots().collect::<Result<_, _>>().unwrap();
    assert_eq!(back, snaps);
}

#[test]
fn duplicate_dates_in_archive_keep_the_first() {
    let header = ArchiveHeader::new(SamplingMode::Monthly, vec![ValueWidth::Eight]);
    let mut writer = ArchiveWriter::new(Vec::new(), &header, 1024).unwrap();
    writer
        .write_snapshot(&Snapshot::new(ymd(2000, 2, 1), vec![Some(1.0)]))
        .unwrap();
    writer
        .write_snapshot(&Snapshot::new(ymd(2000, 1, 1), vec![Some(5.0)]))
        .unwrap();
    writer
        .write_snapshot(&Snapshot::new(ymd(2000, 2, 1), vec![Some(9.0)]))
        .unwrap();
    let buf = writer.finish().unwrap();

    let store = SnapshotStore::new(1);
    let report = load_into(&store, buf.as_slice()).unwrap();
    assert_eq!(report.loaded, 2);
    assert_eq!(store.snapshot_at(0).unwrap().values(), &[Some(5.0)]);
    assert_eq!(store.snapshot_at(1).unwrap().values(), &[Some(1.0)]);
}

proptest! {
    #[test]
    fn blocks_stay_within_limit(count in 1usize..200, limit in 40usize..2000) {
        let snaps = daily_snapshots(ymd(1999, 12, 1), count, |i| vec![Some(i as f64), None]);
        let header = ArchiveHeader::new(
            SamplingMode::Monthly,
            vec![ValueWidth::Eight, ValueWidth::Four],
        );
        let mut writer = ArchiveWriter::new(Vec::new(), &header, limit).unwrap();
        for s in &snaps {
            writer.write_snapshot(s).unwrap();
        }
        let buf = writer.finish().unwrap();

        // Walk the block frames directly.
        let header_len = 4 + 1 + 1 + 4 + 4 + 2;
        let mut pos = header_len;
        let mut records = 0;
        while pos < buf.len() {
            let len = u32::from_le_bytes(buf[pos..pos + 4].try_into().unwrap()) as usize;
            let n = u32::from_le_bytes(buf[pos + 4..pos + 8].try_into().unwrap());
            prop_assert!(len <= limit || n == 1);
            records += n as usize;
            pos += 8 + len;
        }
        prop_assert_eq!(pos, buf.len());
        prop_assert_eq!(records, count);

        let back: Vec<_> = ArchiveReader::open(buf.as_slice())
            .unwrap()
            .snapshots()
            .collect::<Result<_, _>>()
            .unwrap();
        prop_assert_eq!(back, snaps);
    }
}
