use crate::{animation::flight::FlightFrame, batch::store::BatchId};

/// Callbacks consumed by the host UI layer.
///
/// Every method defaults to a no-op. Returned errors are logged and swallowed by the
/// orchestrator; they never affect batch accounting.
pub trait FlightHost {
    /// Fired synchronously before a batch is created.
    fn on_before_trigger(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Aggregate batch progress in `[0, 1]`, throttled and non-decreasing per batch.
    fn on_progress(&mut self, _batch: BatchId, _progress: f64) -> anyhow::Result<()> {
        Ok(())
    }

    /// Fired exactly once per batch after every run resolved.
    fn on_batch_complete(&mut self, _batch: BatchId) -> anyhow::Result<()> {
        Ok(())
    }

    /// Visual state of one internally driven clone for the current tick.
    fn on_frame(&mut self, _frame: &FlightFrame) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Host that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullHost;

impl FlightHost for NullHost {}

/// One recorded [`FlightHost`] callback.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    /// [`FlightHost::on_before_trigger`].
    BeforeTrigger,
    /// [`FlightHost::on_progress`].
    Progress {
        /// Reporting batch.
        batch: BatchId,
        /// Aggregate progress.
        progress: f64,
    },
    /// [`FlightHost::on_batch_complete`].
    BatchComplete {
        /// Resolved batch.
        batch: BatchId,
    },
    /// [`FlightHost::on_frame`].
    Frame(FlightFrame),
}

/// Host that records every callback in order.
#[derive(Clone, Debug, Default)]
pub struct RecordingHost {
    /// Callbacks in delivery order.
    pub events: Vec<HostEvent>,
    /// Frames are skipped unless set; they dominate the event volume.
    pub record_frames: bool,
}

impl RecordingHost {
    /// Record everything but frames.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record frames too.
    pub fn with_frames() -> Self {
        Self {
            events: Vec::new(),
            record_frames: true,
        }
    }

    /// Progress values pushed for `batch`, in order.
    pub fn progress_of(&self, batch: BatchId) -> Vec<f64> {
        self.events
            .iter()
            .filter_map(|e| match e {
                HostEvent::Progress { batch: b, progress } if *b == batch => Some(*progress),
                _ => None,
            })
            .collect()
    }

    /// How many times `batch` was reported complete.
    pub fn completions_of(&self, batch: BatchId) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, HostEvent::BatchComplete { batch: b } if *b == batch))
            .count()
    }

    /// Frames recorded for `batch`.
    pub fn frames_of(&self, batch: BatchId) -> Vec<FlightFrame> {
        self.events
            .iter()
            .filter_map(|e| match e {
                HostEvent::Frame(f) if f.batch == batch => Some(*f),
                _ => None,
            })
            .collect()
    }
}

impl FlightHost for RecordingHost {
    fn on_before_trigger(&mut self) -> anyhow::Result<()> {
        self.events.push(HostEvent::BeforeTrigger);
        Ok(())
    }

    fn on_progress(&mut self, batch: BatchId, progress: f64) -> anyhow::Result<()> {
        self.events.push(HostEvent::Progress { batch, progress });
        Ok(())
    }

    fn on_batch_complete(&mut self, batch: BatchId) -> anyhow::Result<()> {
        self.events.push(HostEvent::BatchComplete { batch });
        Ok(())
    }

    fn on_frame(&mut self, frame: &FlightFrame) -> anyhow::Result<()> {
        if self.record_frames {
            self.events.push(HostEvent::Frame(*frame));
        }
        Ok(())
    }
}
