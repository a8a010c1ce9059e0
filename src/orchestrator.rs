use std::collections::BTreeMap;

use crate::{
    animation::bezier::Easings,
    animation::flight::{FlightFrame, FlightPath},
    animation::schedule::{RunState, SubRun, stagger_schedule},
    batch::store::{BatchId, BatchStore},
    foundation::core::Geometry,
    foundation::error::{FlycartError, FlycartResult},
    host::FlightHost,
};

/// Default flight duration, in milliseconds.
pub const DEFAULT_DURATION_MS: f64 = 600.0;

/// Who advances the runs of a batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Driver {
    /// Runs are sampled by [`Orchestrator::tick`].
    #[default]
    Internal,
    /// The host animates the clones and reports back through
    /// [`Orchestrator::report_progress`] and [`Orchestrator::report_completion`].
    External,
}

/// Everything needed to launch one batch.
#[derive(Clone, Debug, PartialEq)]
pub struct FlightRequest {
    /// Box the clones launch from.
    pub source: Geometry,
    /// Box the clones fly into.
    pub destination: Geometry,
    /// Number of clones to fly; must be at least 1.
    pub count: u32,
    /// Flight time of each clone; must be finite and positive.
    pub duration_ms: f64,
    /// Per-channel curves.
    pub easings: Easings,
    /// Host-level motion reduction preference: runs resolve instantly, nothing flies.
    pub reduced_motion: bool,
    /// Who advances the runs.
    pub driver: Driver,
}

impl FlightRequest {
    /// One clone with the default duration and cart easings.
    pub fn new(source: Geometry, destination: Geometry) -> Self {
        Self {
            source,
            destination,
            count: 1,
            duration_ms: DEFAULT_DURATION_MS,
            easings: Easings::default(),
            reduced_motion: false,
            driver: Driver::Internal,
        }
    }

    /// Reject input that must not create a batch.
    pub fn validate(&self) -> FlycartResult<()> {
        if self.count < 1 {
            return Err(FlycartError::validation("count must be >= 1"));
        }
        if !(self.duration_ms.is_finite() && self.duration_ms > 0.0) {
            return Err(FlycartError::validation(
                "duration_ms must be finite and > 0",
            ));
        }
        self.source.validate("source")?;
        self.destination.validate("destination")?;
        self.easings.validate()
    }

    /// Whether clones actually travel. Zero-area boxes and reduced motion skip the flight.
    pub fn is_animated(&self) -> bool {
        !self.reduced_motion && !self.source.is_zero_area() && !self.destination.is_zero_area()
    }
}

/// Result of a successful [`Orchestrator::trigger`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Launch {
    /// Id of the new batch.
    pub batch: BatchId,
    /// Absolute start time of each run, in stagger order.
    pub starts_ms: Vec<f64>,
    /// `false` when every run was resolved during the trigger call.
    pub animated: bool,
}

// Host notifications produced by one bookkeeping step, delivered after it.
#[derive(Default)]
struct Owed {
    progress: Option<f64>,
    resolved: bool,
}

struct LaunchedBatch {
    runs: Vec<SubRun>,
    duration_ms: f64,
    easings: Easings,
    path: FlightPath,
    driver: Driver,
}

/// Drives triggered actions from request to batch-level completion.
///
/// Single-threaded and clock-agnostic: the host owns the event loop and calls
/// [`Orchestrator::tick`] once per display refresh with the same millisecond clock it
/// passes to [`Orchestrator::trigger`]. Each orchestrator owns its [`BatchStore`].
pub struct Orchestrator<H: FlightHost> {
    host: H,
    store: BatchStore,
    launched: BTreeMap<BatchId, LaunchedBatch>,
    disposed: bool,
}

impl<H: FlightHost> Orchestrator<H> {
    /// An idle orchestrator delivering to `host`.
    pub fn new(host: H) -> Self {
        Self {
            host,
            store: BatchStore::new(),
            launched: BTreeMap::new(),
            disposed: false,
        }
    }

    /// Validate, create the batch, and schedule its staggered runs.
    ///
    /// Never blocks. Invalid input is rejected before any batch exists. When the flight
    /// is skipped (reduced motion or zero-area geometry) every run resolves before this
    /// returns, so the host may observe progress and completion during the call.
    #[tracing::instrument(skip(self, request), fields(count = request.count))]
    pub fn trigger(&mut self, now_ms: f64, request: &FlightRequest) -> FlycartResult<Launch> {
        if self.disposed {
            return Err(FlycartError::Disposed);
        }
        request.validate()?;

        self.notify("on_before_trigger", |h| h.on_before_trigger());

        let batch = self.store.create(request.count);
        let runs = stagger_schedule(now_ms, request.duration_ms, request.count);
        let starts_ms = runs.iter().map(|r| r.start_ms).collect();
        let animated = request.is_animated();
        tracing::debug!(%batch, animated, driver = ?request.driver, "batch created");

        self.launched.insert(
            batch,
            LaunchedBatch {
                runs,
                duration_ms: request.duration_ms,
                easings: request.easings,
                path: FlightPath::between(&request.source, &request.destination),
                driver: request.driver,
            },
        );

        if !animated {
            // Settle every run before the host hears about any of them.
            let owed: Vec<Owed> = (0..request.count as usize)
                .filter_map(|index| self.settle_run(batch, index))
                .collect();
            for owed in owed {
                self.deliver(batch, owed);
            }
        }

        Ok(Launch {
            batch,
            starts_ms,
            animated,
        })
    }

    /// Sample every internally driven run at `now_ms`.
    pub fn tick(&mut self, now_ms: f64) {
        if self.disposed {
            return;
        }
        let batches: Vec<(BatchId, usize)> = self
            .launched
            .iter()
            .filter(|(_, l)| l.driver == Driver::Internal)
            .map(|(id, l)| (*id, l.runs.len()))
            .collect();
        for (batch, count) in batches {
            for index in 0..count {
                self.step_run(batch, index, now_ms);
            }
        }
    }

    /// Progress signal from a host-driven run. Stale or unknown signals are ignored.
    pub fn report_progress(&mut self, batch: BatchId, index: u32, progress: f64) {
        if self.disposed || !self.is_external(batch) {
            tracing::debug!(%batch, index, "ignoring stale progress signal");
            return;
        }
        if progress.is_nan() {
            return;
        }
        if progress >= 1.0 {
            self.finish_run(batch, index as usize);
            return;
        }
        let Some(run) = self
            .launched
            .get_mut(&batch)
            .and_then(|l| l.runs.get_mut(index as usize))
        else {
            return;
        };
        run.begin();
        let delta = run.advance(progress);
        if delta > 0.0 {
            self.credit(batch, delta);
        }
    }

    /// Completion signal from a host-driven run. Duplicates are ignored.
    pub fn report_completion(&mut self, batch: BatchId, index: u32) {
        if self.disposed || !self.is_external(batch) {
            tracing::debug!(%batch, index, "ignoring stale completion signal");
            return;
        }
        self.finish_run(batch, index as usize);
    }

    /// Drop all in-flight work without delivering any further callbacks.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        tracing::debug!(pending = self.store.len(), "orchestrator disposed");
        self.disposed = true;
        self.launched.clear();
        self.store.clear();
    }

    /// Whether [`Orchestrator::dispose`] ran.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Whether `batch` is still in flight.
    pub fn has_batch(&self, batch: BatchId) -> bool {
        self.store.has(batch)
    }

    /// Number of batches in flight.
    pub fn pending_batches(&self) -> usize {
        self.store.len()
    }

    /// `true` once every batch resolved.
    pub fn is_idle(&self) -> bool {
        self.store.is_empty()
    }

    /// Per-run lifecycle of an in-flight batch, in stagger order.
    pub fn run_states(&self, batch: BatchId) -> Option<Vec<RunState>> {
        self.launched
            .get(&batch)
            .map(|l| l.runs.iter().map(|r| r.state).collect())
    }

    /// Borrow the host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutably borrow the host.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Consume the orchestrator and return the host.
    pub fn into_host(self) -> H {
        self.host
    }

    fn is_external(&self, batch: BatchId) -> bool {
        self.launched
            .get(&batch)
            .is_some_and(|l| l.driver == Driver::External)
    }

    fn step_run(&mut self, batch: BatchId, index: usize, now_ms: f64) {
        let Some(launched) = self.launched.get_mut(&batch) else {
            return;
        };
        let duration_ms = launched.duration_ms;
        let Some(run) = launched.runs.get_mut(index) else {
            return;
        };
        if !run.start_if_due(now_ms) {
            return;
        }

        let progress = run.progress_at(now_ms, duration_ms).max(run.progress);
        let delta = if progress < 1.0 {
            run.advance(progress)
        } else {
            0.0
        };
        let frame = FlightFrame {
            batch,
            index: run.index,
            progress,
            sample: launched.path.sample(&launched.easings, progress),
        };

        let owed = if progress >= 1.0 {
            self.settle_run(batch, index)
        } else if delta > 0.0 {
            Some(self.book_progress(batch, delta))
        } else {
            None
        };
        self.notify("on_frame", |h| h.on_frame(&frame));
        if let Some(owed) = owed {
            self.deliver(batch, owed);
        }
    }

    fn credit(&mut self, batch: BatchId, delta: f64) {
        let owed = self.book_progress(batch, delta);
        self.deliver(batch, owed);
    }

    fn finish_run(&mut self, batch: BatchId, index: usize) {
        if let Some(owed) = self.settle_run(batch, index) {
            self.deliver(batch, owed);
        }
    }

    fn book_progress(&mut self, batch: BatchId, delta: f64) -> Owed {
        if self.store.add_progress(batch, delta).is_none() {
            return Owed::default();
        }
        Owed {
            progress: self.store.take_report(batch, false),
            resolved: false,
        }
    }

    // Terminal transition for one run: top up to 1.0, force a progress report, count the
    // completion. The batch is gone from both maps once the last run lands. Returns `None`
    // when the run had already completed.
    fn settle_run(&mut self, batch: BatchId, index: usize) -> Option<Owed> {
        let delta = self
            .launched
            .get_mut(&batch)
            .and_then(|l| l.runs.get_mut(index))
            .and_then(SubRun::complete)?;

        self.store.add_progress(batch, delta);
        let progress = self.store.take_report(batch, true);
        let resolved = self.store.record_completion(batch).resolved;
        if resolved {
            self.launched.remove(&batch);
            tracing::debug!(%batch, "batch resolved");
        }
        Some(Owed { progress, resolved })
    }

    // Host callbacks run only after the store is consistent, so a host that unwinds out
    // of a callback cannot strand a batch.
    fn deliver(&mut self, batch: BatchId, owed: Owed) {
        if let Some(progress) = owed.progress {
            tracing::trace!(%batch, progress, "progress");
            self.notify("on_progress", |h| h.on_progress(batch, progress));
        }
        if owed.resolved {
            self.notify("on_batch_complete", |h| h.on_batch_complete(batch));
        }
    }

    fn notify(&mut self, callback: &'static str, f: impl FnOnce(&mut H) -> anyhow::Result<()>) {
        if let Err(err) = f(&mut self.host) {
            tracing::warn!(callback, error = %err, "host callback failed");
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/orchestrator.rs"]
mod tests;
