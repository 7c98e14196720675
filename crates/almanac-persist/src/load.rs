//! Saving a whole store and loading one back.
//!
//! Both helpers keep I/O outside the store lock: [`save_store`] copies the
//! sequence under the lock and encodes the copy, [`load_into`] decodes the
//! whole stream first and takes the lock once to install the result.

use std::io::{Read, Write};

use almanac_core::Snapshot;
use almanac_store::SnapshotStore;
use log::{info, warn};

use crate::error::PersistError;
use crate::reader::ArchiveReader;
use crate::types::{ArchiveHeader, LoadReport, SaveReport};
use crate::writer::ArchiveWriter;

/// Write every snapshot in `store` to `sink` as one archive.
///
/// `header` must declare as many metrics as the store holds per snapshot.
pub fn save_store<W: Write>(
    store: &SnapshotStore,
    header: &ArchiveHeader,
    sink: W,
    max_block_bytes: usize,
) -> Result<SaveReport, PersistError> {
    if header.metric_count() != store.metric_count() {
        return Err(PersistError::MetricCountMismatch {
            expected: header.metric_count(),
            found: store.metric_count(),
        });
    }

    let snapshots = store.lock().as_slice().to_vec();

    let mut writer = ArchiveWriter::new(sink, header, max_block_bytes)?;
    for snapshot in &snapshots {
        writer.write_snapshot(snapshot)?;
    }
    writer.end_block()?;
    let report = SaveReport {
        records: writer.records_written(),
        blocks: writer.blocks_written(),
    };
    writer.finish()?;

    info!(
        "saved {} snapshots in {} blocks",
        report.records, report.blocks
    );
    Ok(report)
}

/// Replace the contents of `store` with the snapshots archived in `source`.
///
/// Records with fewer metrics than the store are padded with absent
/// values; extra trailing metrics are dropped. A stream that ends or breaks
/// mid-block keeps everything decoded before the break and reports
/// `truncated`. Header errors (bad magic, unknown version) leave the store
/// untouched.
pub fn load_into<R: Read>(store: &SnapshotStore, source: R) -> Result<LoadReport, PersistError> {
    let mut reader = ArchiveReader::open(source)?;
    let width = store.metric_count();

    let mut snapshots = Vec::new();
    let mut truncated = false;
    let mut dropped_metrics = 0;
    loop {
        match reader.next_snapshot() {
            Ok(Some(snapshot)) => {
                let extra = snapshot.metric_count().saturating_sub(width);
                dropped_metrics = dropped_metrics.max(extra);
                snapshots.push(fit_width(snapshot, width));
            }
            Ok(None) => break,
            Err(e) if e.is_truncation() => {
                warn!(
                    "archive truncated after {} snapshots: {e}",
                    snapshots.len()
                );
                truncated = true;
                break;
            }
            Err(e) => return Err(e),
        }
    }

    if dropped_metrics > 0 {
        warn!("dropped up to {dropped_metrics} trailing metrics not in the current catalog");
    }

    let skipped = reader.skipped();
    let loaded = store.lock().restore(snapshots)?;
    info!("loaded {loaded} snapshots ({skipped} skipped)");

    Ok(LoadReport {
        version: reader.version(),
        header: reader.header().clone(),
        loaded,
        skipped,
        truncated,
        dropped_metrics,
    })
}

fn fit_width(snapshot: Snapshot, width: usize) -> Snapshot {
    if snapshot.metric_count() == width {
        return snapshot;
    }
    let mut values = snapshot.values().to_vec();
    values.resize(width, None);
    Snapshot::new(snapshot.timestamp(), values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use almanac_core::ValueWidth;
    use almanac_store::SamplingMode;
    use almanac_test_utils::{monthly_snapshots, ymd};

    fn filled(count: usize) -> SnapshotStore {
        let store = SnapshotStore::new(2);
        store
            .lock()
            .restore(monthly_snapshots(ymd(2000, 1, 1), count, |i| {
                vec![Some(i as f64), None]
            }))
            .unwrap();
        store
    }

    fn header(count: usize) -> ArchiveHeader {
        ArchiveHeader::new(SamplingMode::Monthly, vec![ValueWidth::Eight; count])
    }

    #[test]
    fn save_then_load_restores_store() {
        let source = filled(30);
        let mut buf = Vec::new();
        let saved = save_store(&source, &header(2), &mut buf, 256).unwrap();
        assert_eq!(saved.records, 30);
        assert!(saved.blocks > 1);

        let target = SnapshotStore::new(2);
        let report = load_into(&target, buf.as_slice()).unwrap();
        assert_eq!(report.loaded, 30);
        assert!(!report.truncated);
        assert_eq!(target.lock().as_slice(), source.lock().as_slice());
    }

    #[test]
    fn header_width_mismatch_refused_on_save() {
        let err = save_store(&filled(1), &header(3), Vec::new(), 1024).unwrap_err();
        assert!(matches!(
            err,
            PersistError::MetricCountMismatch {
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn narrower_store_drops_trailing_metrics() {
        let mut buf = Vec::new();
        save_store(&filled(3), &header(2), &mut buf, 1024).unwrap();

        let target = SnapshotStore::new(1);
        let report = load_into(&target, buf.as_slice()).unwrap();
        assert_eq!(report.dropped_metrics, 1);
        assert_eq!(target.snapshot_at(2).unwrap().values(), &[Some(2.0)]);
    }

    #[test]
    fn wider_store_pads_with_absent() {
        let mut buf = Vec::new();
        save_store(&filled(3), &header(2), &mut buf, 1024).unwrap();

        let target = SnapshotStore::new(4);
        let report = load_into(&target, buf.as_slice()).unwrap();
        assert_eq!(report.dropped_metrics, 0);
        assert_eq!(
            target.snapshot_at(1).unwrap().values(),
            &[Some(1.0), None, None, None]
        );
    }

    #[test]
    fn bad_magic_leaves_store_untouched() {
        let target = filled(2);
        assert!(load_into(&target, b"NOPE\x02".as_slice()).is_err());
        assert_eq!(target.len(), 2);
    }
}
