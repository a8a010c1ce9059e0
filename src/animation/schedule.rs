/// Offset between successive run starts within one batch.
///
/// Half the duration is spread across the batch, so the last run starts before the
/// first one lands.
pub fn stagger_interval_ms(duration_ms: f64, count: u32) -> f64 {
    if count > 1 {
        duration_ms / (2.0 * f64::from(count))
    } else {
        0.0
    }
}

/// Lifecycle of one run. `Completed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum RunState {
    /// Waiting for its staggered start time.
    Scheduled,
    /// Being sampled or animated by the host.
    Running,
    /// Reached `1.0` and was counted by the batch.
    Completed,
}

/// One independently timed flight within a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct SubRun {
    /// Stagger position within the batch, `0..count`.
    pub index: u32,
    /// Absolute start time in host milliseconds.
    pub start_ms: f64,
    /// Current lifecycle state.
    pub state: RunState,
    /// Local time progress already credited to the batch.
    pub progress: f64,
}

impl SubRun {
    /// A run that has not started yet.
    pub fn new(index: u32, start_ms: f64) -> Self {
        Self {
            index,
            start_ms,
            state: RunState::Scheduled,
            progress: 0.0,
        }
    }

    /// Whether the terminal transition happened.
    pub fn is_completed(&self) -> bool {
        self.state == RunState::Completed
    }

    /// `Scheduled -> Running` once `now_ms` reaches the start. Returns whether the run is
    /// running after the call.
    pub fn start_if_due(&mut self, now_ms: f64) -> bool {
        if now_ms >= self.start_ms {
            self.begin();
        }
        self.state == RunState::Running
    }

    /// `Scheduled -> Running` regardless of the clock, for runs animated by the host.
    pub fn begin(&mut self) {
        if self.state == RunState::Scheduled {
            self.state = RunState::Running;
        }
    }

    /// Linear local progress at `now_ms`; exactly `1.0` once `duration_ms` elapsed.
    pub fn progress_at(&self, now_ms: f64, duration_ms: f64) -> f64 {
        let elapsed = now_ms - self.start_ms;
        if elapsed >= duration_ms {
            1.0
        } else {
            (elapsed / duration_ms).clamp(0.0, 1.0)
        }
    }

    /// Advance to `progress` and return the delta to credit to the batch.
    ///
    /// Progress never regresses; a completed run yields nothing.
    pub fn advance(&mut self, progress: f64) -> f64 {
        if self.is_completed() {
            return 0.0;
        }
        let progress = progress.clamp(0.0, 1.0);
        if progress <= self.progress {
            return 0.0;
        }
        let delta = progress - self.progress;
        self.progress = progress;
        delta
    }

    /// Terminal transition. Returns the delta that tops local progress up to exactly
    /// `1.0`, or `None` when the run had already completed.
    pub fn complete(&mut self) -> Option<f64> {
        if self.is_completed() {
            return None;
        }
        let delta = 1.0 - self.progress;
        self.progress = 1.0;
        self.state = RunState::Completed;
        Some(delta)
    }
}

/// Start offsets for `count` runs launched at `trigger_ms`.
pub fn stagger_schedule(trigger_ms: f64, duration_ms: f64, count: u32) -> Vec<SubRun> {
    let interval = stagger_interval_ms(duration_ms, count);
    (0..count)
        .map(|i| SubRun::new(i, trigger_ms + f64::from(i) * interval))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/animation/schedule.rs"]
mod tests;
