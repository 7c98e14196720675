//! The date-unique, sorted snapshot store.
//!
//! [`SnapshotStore`] wraps its sequence in a single `Mutex`. The only way
//! to reach the sequence is [`SnapshotStore::lock`], which returns a
//! [`StoreGuard`]; every slice handed out borrows from that guard and is
//! therefore only valid while the lock is held. A panicking lock holder
//! cannot wedge the store: the guard is released on unwind and the next
//! acquirer recovers the data from the poisoned mutex.

use std::ops::RangeInclusive;
use std::sync::{Mutex, MutexGuard, PoisonError};

use almanac_core::Snapshot;
use chrono::NaiveDateTime;

use crate::error::StoreError;

/// How to treat a candidate whose timestamp already exists in the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WritePolicy {
    /// Replace the existing record in place.
    Overwrite,
    /// Leave the existing record untouched.
    KeepExisting,
}

/// Result of [`StoreGuard::try_insert_or_overwrite`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// No record had this timestamp; the candidate was inserted at `index`.
    Inserted {
        /// Sorted position of the new record.
        index: usize,
    },
    /// The record at `index` was replaced.
    Overwritten {
        /// Position of the replaced record.
        index: usize,
    },
    /// A record already existed at `index` and was kept.
    Skipped {
        /// Position of the existing record.
        index: usize,
    },
}

/// An ordered, timestamp-unique sequence of snapshots shared between one
/// writer and any number of readers.
///
/// Created empty at session start, cleared at session end or on user
/// request.
#[derive(Debug)]
pub struct SnapshotStore {
    metric_count: usize,
    snapshots: Mutex<Vec<Snapshot>>,
}

// Compile-time assertion: SnapshotStore must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<SnapshotStore>();
};

impl SnapshotStore {
    /// Create an empty store whose snapshots carry `metric_count` slots.
    pub fn new(metric_count: usize) -> Self {
        Self {
            metric_count,
            snapshots: Mutex::new(Vec::new()),
        }
    }

    /// Acquire the store lock.
    ///
    /// Hold the returned guard for the whole read-then-compute transaction
    /// so that indices stay consistent with the data they index.
    pub fn lock(&self) -> StoreGuard<'_> {
        StoreGuard {
            snapshots: self
                .snapshots
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
            metric_count: self.metric_count,
        }
    }

    /// Number of metric slots every stored snapshot carries.
    pub fn metric_count(&self) -> usize {
        self.metric_count
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store holds no snapshots.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Single indexed read: clones one snapshot out under a brief lock.
    ///
    /// Suitable for one-off lookups. Multi-step reads must use
    /// [`lock`](Self::lock) instead.
    pub fn snapshot_at(&self, index: usize) -> Option<Snapshot> {
        self.lock().get(index).cloned()
    }

    /// Timestamps of the first and last stored snapshots.
    pub fn date_bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let guard = self.lock();
        Some((guard.first()?.timestamp(), guard.last()?.timestamp()))
    }

    /// Remove every snapshot.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

/// Exclusive access to the store's sequence for the lifetime of the guard.
pub struct StoreGuard<'a> {
    snapshots: MutexGuard<'a, Vec<Snapshot>>,
    metric_count: usize,
}

impl StoreGuard<'_> {
    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether the store holds no snapshots.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Snapshot at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    /// Oldest snapshot.
    pub fn first(&self) -> Option<&Snapshot> {
        self.snapshots.first()
    }

    /// Newest snapshot.
    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// The whole sequence, oldest first.
    pub fn as_slice(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Borrow the contiguous sub-sequence `from..=to` without copying.
    ///
    /// Returns `None` if the range is inverted or out of bounds.
    pub fn range(&self, from: usize, to: usize) -> Option<&[Snapshot]> {
        let range: RangeInclusive<usize> = from..=to;
        if from > to {
            return None;
        }
        self.snapshots.get(range)
    }

    /// Binary search by timestamp alone.
    ///
    /// `Ok(i)` when a snapshot with exactly `timestamp` exists at `i`,
    /// otherwise `Err(i)` with the sorted insertion position.
    pub fn search(&self, timestamp: NaiveDateTime) -> Result<usize, usize> {
        self.snapshots
            .binary_search_by(|s| s.timestamp().cmp(&timestamp))
    }

    /// Whether a snapshot exists for exactly `timestamp`.
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.search(timestamp).is_ok()
    }

    /// Insert `candidate` at its sorted position, or resolve a timestamp
    /// collision according to `policy`.
    pub fn try_insert_or_overwrite(
        &mut self,
        candidate: Snapshot,
        policy: WritePolicy,
    ) -> Result<InsertOutcome, StoreError> {
        if candidate.metric_count() != self.metric_count {
            return Err(StoreError::MetricCountMismatch {
                expected: self.metric_count,
                found: candidate.metric_count(),
            });
        }
        match self.search(candidate.timestamp()) {
            Err(index) => {
                self.snapshots.insert(index, candidate);
                Ok(InsertOutcome::Inserted { index })
            }
            Ok(index) => match policy {
                WritePolicy::Overwrite => {
                    self.snapshots[index] = candidate;
                    Ok(InsertOutcome::Overwritten { index })
                }
                WritePolicy::KeepExisting => Ok(InsertOutcome::Skipped { index }),
            },
        }
    }

    /// Replace the contents with `snapshots`, sorted by timestamp.
    ///
    /// When several snapshots share a timestamp, the first one supplied is
    /// kept. Snapshots with the wrong slot count are rejected before any
    /// change is made. Returns the number of snapshots retained.
    pub fn restore(&mut self, snapshots: Vec<Snapshot>) -> Result<usize, StoreError> {
        if let Some(bad) = snapshots
            .iter()
            .find(|s| s.metric_count() != self.metric_count)
        {
            return Err(StoreError::MetricCountMismatch {
                expected: self.metric_count,
                found: bad.metric_count(),
            });
        }
        let mut snapshots = snapshots;
        // Stable sort keeps supply order among equal timestamps.
        snapshots.sort_by_key(|s| s.timestamp());
        snapshots.dedup_by_key(|s| s.timestamp());
        *self.snapshots = snapshots;
        Ok(self.snapshots.len())
    }

    /// Remove every snapshot.
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use almanac_core::calendar::midnight;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        midnight(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn snap(ts: NaiveDateTime, v: f64) -> Snapshot {
        Snapshot::new(ts, vec![Some(v)])
    }

    #[test]
    fn new_store_is_empty() {
        let store = SnapshotStore::new(1);
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(store.date_bounds().is_none());
        assert!(store.snapshot_at(0).is_none());
    }

    #[test]
    fn inserts_land_in_sorted_position() {
        let store = SnapshotStore::new(1);
        let mut guard = store.lock();
        let policy = WritePolicy::KeepExisting;
        assert_eq!(
            guard.try_insert_or_overwrite(snap(day(2000, 3, 1), 3.0), policy),
            Ok(InsertOutcome::Inserted { index: 0 })
        );
        assert_eq!(
            guard.try_insert_or_overwrite(snap(day(2000, 1, 1), 1.0), policy),
            Ok(InsertOutcome::Inserted { index: 0 })
        );
        assert_eq!(
            guard.try_insert_or_overwrite(snap(day(2000, 2, 1), 2.0), policy),
            Ok(InsertOutcome::Inserted { index: 1 })
        );
        let dates: Vec<_> = guard.as_slice().iter().map(|s| s.timestamp()).collect();
        assert_eq!(dates, vec![day(2000, 1, 1), day(2000, 2, 1), day(2000, 3, 1)]);
    }

    #[test]
    fn collision_respects_policy() {
        let store = SnapshotStore::new(1);
        let mut guard = store.lock();
        guard
            .try_insert_or_overwrite(snap(day(2000, 1, 1), 1.0), WritePolicy::Overwrite)
            .unwrap();

        let outcome = guard
            .try_insert_or_overwrite(snap(day(2000, 1, 1), 2.0), WritePolicy::KeepExisting)
            .unwrap();
        assert_eq!(outcome, InsertOutcome::Skipped { index: 0 });
        assert_eq!(guard.get(0).unwrap().values(), &[Some(1.0)]);

        let outcome = guard
            .try_insert_or_overwrite(snap(day(2000, 1, 1), 3.0), WritePolicy::Overwrite)
            .unwrap();
        assert_eq!(outcome, InsertOutcome::Overwritten { index: 0 });
        assert_eq!(guard.get(0).unwrap().values(), &[Some(3.0)]);
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn wrong_slot_count_rejected() {
        let store = SnapshotStore::new(2);
        let err = store
            .lock()
            .try_insert_or_overwrite(snap(day(2000, 1, 1), 1.0), WritePolicy::Overwrite)
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::MetricCountMismatch {
                expected: 2,
                found: 1
            }
        );
        assert!(store.is_empty());
    }

    #[test]
    fn range_borrows_inclusive_slice() {
        let store = SnapshotStore::new(1);
        {
            let mut guard = store.lock();
            for m in 1..=5 {
                guard
                    .try_insert_or_overwrite(snap(day(2000, m, 1), m as f64), WritePolicy::Overwrite)
                    .unwrap();
            }
        }
        let guard = store.lock();
        let slice = guard.range(1, 3).unwrap();
        assert_eq!(slice.len(), 3);
        assert_eq!(slice[0].timestamp(), day(2000, 2, 1));
        assert!(guard.range(3, 1).is_none());
        assert!(guard.range(2, 5).is_none());
    }

    #[test]
    fn restore_sorts_and_keeps_first_duplicate() {
        let store = SnapshotStore::new(1);
        let kept = store
            .lock()
            .restore(vec![
                snap(day(2001, 1, 1), 2.0),
                snap(day(2000, 1, 1), 1.0),
                snap(day(2001, 1, 1), 99.0),
            ])
            .unwrap();
        assert_eq!(kept, 2);
        let guard = store.lock();
        assert_eq!(guard.get(1).unwrap().values(), &[Some(2.0)]);
    }

    #[test]
    fn date_bounds_and_clear() {
        let store = SnapshotStore::new(1);
        store
            .lock()
            .restore(vec![snap(day(2000, 1, 1), 1.0), snap(day(2000, 6, 1), 2.0)])
            .unwrap();
        assert_eq!(
            store.date_bounds(),
            Some((day(2000, 1, 1), day(2000, 6, 1)))
        );
        assert_eq!(store.snapshot_at(1).unwrap().timestamp(), day(2000, 6, 1));
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn panicking_holder_does_not_wedge_store() {
        use std::sync::Arc;
        let store = Arc::new(SnapshotStore::new(1));
        let s = Arc::clone(&store);
        let result = std::thread::spawn(move || {
            let _guard = s.lock();
            panic!("simulated failure while locked");
        })
        .join();
        assert!(result.is_err());
        store
            .lock()
            .try_insert_or_overwrite(snap(day(2000, 1, 1), 1.0), WritePolicy::Overwrite)
            .unwrap();
        assert_eq!(store.len(), 1);
    }

    proptest! {
        #[test]
        fn store_stays_sorted_and_unique(
            days in prop::collection::vec(0i64..2000, 0..200),
            overwrite in any::<bool>(),
        ) {
            let store = SnapshotStore::new(1);
            let policy = if overwrite { WritePolicy::Overwrite } else { WritePolicy::KeepExisting };
            let base = day(2000, 1, 1);
            for (i, d) in days.iter().enumerate() {
                let ts = almanac_core::calendar::add_days(base, *d);
                let mut guard = store.lock();
                guard.try_insert_or_overwrite(snap(ts, i as f64), policy).unwrap();
                let slice = guard.as_slice();
                prop_assert!(slice.windows(2).all(|w| w[0].timestamp() < w[1].timestamp()));
            }
        }

        #[test]
        fn keep_existing_never_changes_value(first in -1e6f64..1e6, second in -1e6f64..1e6) {
            let store = SnapshotStore::new(1);
            let mut guard = store.lock();
            guard.try_insert_or_overwrite(snap(day(2000, 1, 1), first), WritePolicy::KeepExisting).unwrap();
            guard.try_insert_or_overwrite(snap(day(2000, 1, 1), second), WritePolicy::KeepExisting).unwrap();
            prop_assert_eq!(guard.get(0).unwrap().values(), &[Some(first)][..]);
            prop_assert_eq!(guard.len(), 1);
        }
    }
}
