//! Sampling-boundary detection with exactly-once-per-boundary writes.
//!
//! The scheduler is driven by the simulation step, which fires far more
//! often than sampling boundaries and at irregular intervals. It keeps one
//! flag, "already sampled for the current boundary":
//!
//! - boundary holds, flag clear → capture, insert-or-overwrite, set flag
//! - boundary holds, flag set   → nothing
//! - boundary does not hold     → clear flag
//!
//! Before the first sampling decision the flag is reconciled against the
//! store, since a sample for today may already exist from a prior session.
//! Reconciliation is a single binary search for today's boundary date; if
//! the in-world clock jumps backwards after that, the flag is not
//! re-derived.

use almanac_core::calendar::midnight;
use almanac_core::{MetricCatalog, Snapshot};
use chrono::{Datelike, NaiveDateTime, NaiveTime};
use log::{debug, warn};

use crate::error::TickError;
use crate::store::{InsertOutcome, SnapshotStore, WritePolicy};

/// When samples are taken. Selected once at session start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SamplingMode {
    /// A boundary occurs on the first day of every in-world month.
    #[default]
    Monthly,
    /// A boundary occurs once per in-world day, from `threshold` until midnight.
    SubDaily {
        /// Time of day at which the daily boundary opens.
        threshold: NaiveTime,
    },
}

impl SamplingMode {
    /// Sub-daily sampling at local noon.
    pub fn sub_daily_noon() -> Self {
        Self::SubDaily {
            threshold: NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }

    /// Whether `now` falls inside a sampling boundary.
    pub fn is_boundary(&self, now: NaiveDateTime) -> bool {
        match self {
            Self::Monthly => now.day() == 1,
            Self::SubDaily { threshold } => now.time() >= *threshold,
        }
    }

    /// The timestamp a sample taken at `now` is dated to: the calendar day.
    pub fn sample_date(&self, now: NaiveDateTime) -> NaiveDateTime {
        midnight(now.date())
    }
}

/// What a tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// `now` is not a boundary; the flag was cleared.
    Idle,
    /// The current boundary was already sampled.
    AlreadySampled,
    /// A snapshot was captured and written.
    Sampled(InsertOutcome),
}

/// The single writer of a [`SnapshotStore`].
#[derive(Debug)]
pub struct Scheduler {
    mode: SamplingMode,
    sampled: bool,
    reconciled: bool,
}

impl Scheduler {
    /// A scheduler that will reconcile against the store on its first tick.
    pub fn new(mode: SamplingMode) -> Self {
        Self {
            mode,
            sampled: false,
            reconciled: false,
        }
    }

    /// The sampling mode chosen at construction.
    pub fn mode(&self) -> SamplingMode {
        self.mode
    }

    /// Whether the current boundary has been sampled.
    pub fn already_sampled(&self) -> bool {
        self.sampled
    }

    /// Derive the flag from the store's content for `now`.
    ///
    /// The flag is set only if `now` is a boundary and a sample for its
    /// date already exists.
    pub fn reconcile(&mut self, store: &SnapshotStore, now: NaiveDateTime) {
        self.sampled =
            self.mode.is_boundary(now) && store.lock().contains(self.mode.sample_date(now));
        self.reconciled = true;
        debug!("scheduler reconciled at {now}: already_sampled={}", self.sampled);
    }

    /// Forget the flag and reconcile again on the next tick.
    pub fn reset(&mut self) {
        self.sampled = false;
        self.reconciled = false;
    }

    /// Run one simulation step's sampling decision.
    ///
    /// On error the flag is left as it was, so the next tick retries.
    pub fn on_tick(
        &mut self,
        now: NaiveDateTime,
        store: &SnapshotStore,
        catalog: &dyn MetricCatalog,
    ) -> Result<TickOutcome, TickError> {
        if !self.reconciled {
            self.reconcile(store, now);
        }
        if !self.mode.is_boundary(now) {
            self.sampled = false;
            return Ok(TickOutcome::Idle);
        }
        if self.sampled {
            return Ok(TickOutcome::AlreadySampled);
        }
        let outcome = self.write(now, store, catalog, WritePolicy::Overwrite)?;
        self.sampled = true;
        Ok(TickOutcome::Sampled(outcome))
    }

    /// Capture a snapshot immediately, overwriting any record for the same
    /// date. Marks the current boundary as sampled if `now` is one.
    pub fn take_snapshot_now(
        &mut self,
        now: NaiveDateTime,
        store: &SnapshotStore,
        catalog: &dyn MetricCatalog,
    ) -> Result<InsertOutcome, TickError> {
        let outcome = self.write(now, store, catalog, WritePolicy::Overwrite)?;
        if self.mode.is_boundary(now) {
            self.sampled = true;
            self.reconciled = true;
        }
        Ok(outcome)
    }

    fn write(
        &self,
        now: NaiveDateTime,
        store: &SnapshotStore,
        catalog: &dyn MetricCatalog,
        policy: WritePolicy,
    ) -> Result<InsertOutcome, TickError> {
        let date = self.mode.sample_date(now);
        let snapshot = Snapshot::capture(date, catalog).map_err(|e| {
            warn!("discarding sample for {date}: {e}");
            TickError::from(e)
        })?;
        let outcome = store
            .lock()
            .try_insert_or_overwrite(snapshot, policy)
            .map_err(|e| {
                warn!("discarding sample for {date}: {e}");
                TickError::from(e)
            })?;
        debug!("sampled {date}: {outcome:?}");
        Ok(outcome)
    }
}
