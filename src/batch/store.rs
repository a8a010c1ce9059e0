use std::collections::HashMap;

/// Minimum aggregate movement before another progress notification is pushed.
pub const PROGRESS_STEP: f64 = 0.01;
const SETTLE_EPSILON: f64 = 1e-9;

/// Opaque batch handle, unique and never reused within one orchestrator.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct BatchId(pub u64);

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// In-flight state of one triggered action.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    /// Runs launched for this batch, at least one.
    pub expected: u32,
    /// Runs counted as finished so far.
    pub completed: u32,
    /// Sum of every run's local progress, in `[0, expected]`.
    pub progress_sum: f64,
    /// Last value pushed to the host; the throttle baseline.
    pub last_reported: f64,
}

impl Batch {
    fn new(expected: u32) -> Self {
        Self {
            expected,
            completed: 0,
            progress_sum: 0.0,
            last_reported: 0.0,
        }
    }

    /// Mean run progress in `[0, 1]`, exactly `1.0` once every run is fully credited.
    pub fn aggregate(&self) -> f64 {
        let mean = self.progress_sum / f64::from(self.expected);
        // Summed deltas drift; a fully credited batch must read exactly 1.0.
        if 1.0 - mean < SETTLE_EPSILON {
            return 1.0;
        }
        mean.clamp(0.0, 1.0)
    }
}

/// Outcome of [`BatchStore::record_completion`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Completion {
    /// `true` exactly once per batch: on the call that evicted it.
    pub resolved: bool,
}

/// Authoritative home for all in-flight batches.
///
/// Pure state: no clocks, no callbacks. A batch exists from [`BatchStore::create`]
/// until the completion that brings `completed` to `expected`, at which point it is
/// removed in the same call. Every operation on an unknown id is a no-op.
#[derive(Debug, Default)]
pub struct BatchStore {
    last_id: u64,
    batches: HashMap<BatchId, Batch>,
}

impl BatchStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a batch of `expected` runs. Callers validate `expected >= 1`.
    pub fn create(&mut self, expected: u32) -> BatchId {
        debug_assert!(expected >= 1, "batch must expect at least one run");
        self.last_id += 1;
        let id = BatchId(self.last_id);
        self.batches.insert(id, Batch::new(expected.max(1)));
        id
    }

    /// Count one finished run. The batch is evicted when the count reaches `expected`.
    pub fn record_completion(&mut self, id: BatchId) -> Completion {
        let Some(batch) = self.batches.get_mut(&id) else {
            return Completion { resolved: false };
        };
        batch.completed += 1;
        if batch.completed >= batch.expected {
            self.batches.remove(&id);
            return Completion { resolved: true };
        }
        Completion { resolved: false }
    }

    /// Accumulate one run's progress delta and return the new aggregate.
    pub fn add_progress(&mut self, id: BatchId, delta: f64) -> Option<f64> {
        let batch = self.batches.get_mut(&id)?;
        batch.progress_sum += delta;
        Some(batch.aggregate())
    }

    /// Throttle gate for host notifications.
    ///
    /// Returns the value to push when the aggregate moved by more than
    /// [`PROGRESS_STEP`] since the last push, or unconditionally when `terminal` is set.
    /// The pushed value never falls below the previous one.
    pub fn take_report(&mut self, id: BatchId, terminal: bool) -> Option<f64> {
        let batch = self.batches.get_mut(&id)?;
        let aggregate = batch.aggregate().max(batch.last_reported);
        if terminal || aggregate - batch.last_reported > PROGRESS_STEP {
            batch.last_reported = aggregate;
            return Some(aggregate);
        }
        None
    }

    /// Whether `id` is still in flight.
    pub fn has(&self, id: BatchId) -> bool {
        self.batches.contains_key(&id)
    }

    /// In-flight state of `id`.
    pub fn get(&self, id: BatchId) -> Option<&Batch> {
        self.batches.get(&id)
    }

    /// Number of batches in flight.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// `true` when no batch is in flight.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Drop every batch without resolving any of them.
    pub fn clear(&mut self) {
        self.batches.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/batch/store.rs"]
mod tests;
