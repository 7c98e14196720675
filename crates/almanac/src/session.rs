//! The session: owner of one snapshot history.
//!
//! A [`Session`] bundles the store, the scheduler that writes it and the
//! catalog it samples. Single-threaded hosts drive it directly. Hosts that
//! sample on the simulation thread and render on the UI thread call
//! [`Session::split`] and hand the [`Recorder`] and [`Viewer`] to
//! their respective threads; the two meet only at the store's lock.

use std::io::{Read, Write};
use std::sync::Arc;

use almanac_core::{verify_catalog, MetricCatalog, Snapshot};
use almanac_persist::{load_into, save_store, ArchiveHeader, LoadReport, SaveReport};
use almanac_render::{RangeUnit, RenderError, RenderOutput, RenderRequest};
use almanac_store::{InsertOutcome, SamplingMode, Scheduler, SnapshotStore, TickError, TickOutcome};
use chrono::NaiveDateTime;
use log::{error, info, warn};

use crate::config::SessionConfig;
use crate::error::SessionError;

#[derive(Clone)]
struct Shared {
    config: SessionConfig,
    catalog: Arc<dyn MetricCatalog>,
    store: Arc<SnapshotStore>,
}

// ── Session ─────────────────────────────────────────────────────

/// One game session's snapshot history, with its sampler and renderer.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use almanac::prelude::*;
/// use almanac_test_utils::{ymd, MockCatalog};
///
/// let catalog = Arc::new(MockCatalog::new(1));
/// catalog.set(0, Some(42.0));
/// let mut session = Session::start(SessionConfig::default(), catalog).unwrap();
///
/// for now in [ymd(2000, 1, 1), ymd(2000, 1, 2), ymd(2000, 2, 1)] {
///     session.on_tick(now).unwrap();
/// }
/// assert_eq!(session.len(), 2);
///
/// let request = RenderRequest::new(DisplayRange::All, [MetricId(0)]);
/// let out = session.render(&request, ymd(2000, 2, 1)).unwrap();
/// assert_eq!(out.series[0].points.len(), 2);
/// ```
pub struct Session {
    recorder: Recorder,
    viewer: Viewer,
}

impl Session {
    /// Validate `config`, verify `catalog` and open an empty history.
    ///
    /// A catalog that fails verification is logged and reported as
    /// [`SessionError::Catalog`]; the host keeps running without charts.
    pub fn start(
        config: SessionConfig,
        catalog: Arc<dyn MetricCatalog>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        if let Err(e) = verify_catalog(catalog.as_ref()) {
            error!("metric catalog failed verification, charting disabled: {e}");
            return Err(e.into());
        }

        let shared = Shared {
            store: Arc::new(SnapshotStore::new(catalog.len())),
            catalog,
            config,
        };
        info!(
            "session started: {} metrics, {:?} sampling",
            shared.catalog.len(),
            config.sampling
        );
        Ok(Self {
            recorder: Recorder {
                scheduler: Scheduler::new(config.sampling),
                shared: shared.clone(),
            },
            viewer: Viewer { shared },
        })
    }

    /// Run one simulation step's sampling decision.
    pub fn on_tick(&mut self, now: NaiveDateTime) -> Result<TickOutcome, TickError> {
        self.recorder.on_tick(now)
    }

    /// Sample immediately, overwriting any snapshot for the same date.
    pub fn take_snapshot_now(&mut self, now: NaiveDateTime) -> Result<InsertOutcome, TickError> {
        self.recorder.take_snapshot_now(now)
    }

    /// Render the selected metrics over the requested range.
    pub fn render(
        &self,
        request: &RenderRequest,
        now: NaiveDateTime,
    ) -> Result<RenderOutput, RenderError> {
        self.viewer.render(request, now)
    }

    /// Timestamps of the first and last snapshots, if any.
    pub fn date_bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        self.viewer.date_bounds()
    }

    /// A copy of the snapshot at `index`.
    pub fn snapshot_at(&self, index: usize) -> Option<Snapshot> {
        self.viewer.snapshot_at(index)
    }

    /// Number of snapshots recorded.
    pub fn len(&self) -> usize {
        self.viewer.len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.viewer.is_empty()
    }

    /// Delete the whole history at the user's request.
    pub fn reset(&mut self) {
        self.recorder.reset();
    }

    /// Write the history to `sink` as one archive.
    pub fn save<W: Write>(&self, sink: W) -> Result<SaveReport, SessionError> {
        self.viewer.save(sink)
    }

    /// Replace the history with the archive read from `source`.
    pub fn load<R: Read>(&mut self, source: R) -> Result<LoadReport, SessionError> {
        self.recorder.load(source)
    }

    /// The configuration the session started with.
    pub fn config(&self) -> &SessionConfig {
        &self.viewer.shared.config
    }

    /// The catalog the session samples.
    pub fn catalog(&self) -> &dyn MetricCatalog {
        self.viewer.catalog()
    }

    /// Hand the writing and reading roles to separate threads.
    pub fn split(self) -> (Recorder, Viewer) {
        (self.recorder, self.viewer)
    }

    /// End the session, discarding its history.
    pub fn end(self) {
        let discarded = self.len();
        self.recorder.shared.store.clear();
        info!("session ended, {discarded} snapshots discarded");
    }
}

// ── Recorder ────────────────────────────────────────────────────

/// The producer role: the only writer of the history.
///
/// Owns the scheduler, so there is exactly one per session.
pub struct Recorder {
    scheduler: Scheduler,
    shared: Shared,
}

impl Recorder {
    /// Run one simulation step's sampling decision.
    pub fn on_tick(&mut self, now: NaiveDateTime) -> Result<TickOutcome, TickError> {
        self.scheduler
            .on_tick(now, &self.shared.store, self.shared.catalog.as_ref())
    }

    /// Sample immediately, overwriting any snapshot for the same date.
    pub fn take_snapshot_now(&mut self, now: NaiveDateTime) -> Result<InsertOutcome, TickError> {
        self.scheduler
            .take_snapshot_now(now, &self.shared.store, self.shared.catalog.as_ref())
    }

    /// Delete the whole history and re-derive the sampled flag next tick.
    pub fn reset(&mut self) {
        let discarded = self.shared.store.len();
        self.shared.store.clear();
        self.scheduler.reset();
        info!("snapshot history deleted ({discarded} snapshots)");
    }

    /// Replace the history with the archive read from `source`.
    ///
    /// The scheduler re-derives its flag from the loaded history on the
    /// next tick.
    pub fn load<R: Read>(&mut self, source: R) -> Result<LoadReport, SessionError> {
        let report = load_into(&self.shared.store, source)?;
        if report.header.mode != self.shared.config.sampling {
            warn!(
                "archive was recorded with {:?} sampling, session uses {:?}",
                report.header.mode, self.shared.config.sampling
            );
        }
        self.scheduler.reset();
        Ok(report)
    }

    /// The sampling mode in force.
    pub fn sampling(&self) -> SamplingMode {
        self.scheduler.mode()
    }
}

// ── Viewer ──────────────────────────────────────────────────────

/// The consumer role: read-only access for rendering and saving.
///
/// Cheap to clone; every clone sees the same history.
#[derive(Clone)]
pub struct Viewer {
    shared: Shared,
}

impl Viewer {
    /// Render the selected metrics over the requested range.
    pub fn render(
        &self,
        request: &RenderRequest,
        now: NaiveDateTime,
    ) -> Result<RenderOutput, RenderError> {
        let Shared {
            config,
            catalog,
            store,
        } = &self.shared;
        almanac_render::render(
            store,
            request,
            &config.render,
            RangeUnit::from(config.sampling),
            catalog.as_ref(),
            now,
        )
    }

    /// Timestamps of the first and last snapshots, if any.
    pub fn date_bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        self.shared.store.date_bounds()
    }

    /// A copy of the snapshot at `index`.
    pub fn snapshot_at(&self, index: usize) -> Option<Snapshot> {
        self.shared.store.snapshot_at(index)
    }

    /// Number of snapshots recorded.
    pub fn len(&self) -> usize {
        self.shared.store.len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.shared.store.is_empty()
    }

    /// Write the history to `sink` as one archive.
    pub fn save<W: Write>(&self, sink: W) -> Result<SaveReport, SessionError> {
        let Shared {
            config,
            catalog,
            store,
        } = &self.shared;
        let header = ArchiveHeader::for_catalog(config.sampling, catalog.as_ref());
        Ok(save_store(store, &header, sink, config.max_block_bytes)?)
    }

    /// The catalog the session samples.
    pub fn catalog(&self) -> &dyn MetricCatalog {
        self.shared.catalog.as_ref()
    }
}
