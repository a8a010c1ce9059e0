use crate::{
    batch::store::BatchId,
    config::SimulationConfig,
    foundation::error::{FlycartError, FlycartResult},
    host::{HostEvent, RecordingHost},
    orchestrator::{Driver, Orchestrator},
};

/// Everything observed during one [`simulate`] call.
#[derive(Clone, Debug, serde::Serialize)]
pub struct SimulationReport {
    /// Batch ids in press order.
    pub batches: Vec<BatchId>,
    /// Every host callback, in delivery order.
    pub events: Vec<HostEvent>,
    /// Timestamp of the tick that left the orchestrator idle.
    pub finished_ms: f64,
}

/// Replay a button being pressed `triggers` times against a fixed-rate display loop.
///
/// Deterministic: the clock advances in exact `1000 / fps` steps and presses land on
/// the first tick at or after their scheduled time.
#[tracing::instrument(skip(cfg), fields(fps = cfg.fps, triggers = cfg.triggers))]
pub fn simulate(cfg: &SimulationConfig, record_frames: bool) -> FlycartResult<SimulationReport> {
    cfg.validate()?;
    if cfg.flight.driver == Driver::External {
        return Err(FlycartError::config(
            "simulation drives runs itself; use the internal driver",
        ));
    }

    let host = RecordingHost {
        events: Vec::new(),
        record_frames,
    };
    let mut orch = Orchestrator::new(host);
    let request = cfg.request();
    let step_ms = cfg.frame_interval_ms();
    let deadline_ms = settle_deadline_ms(cfg);

    let mut batches = Vec::new();
    let mut frame: u64 = 0;
    loop {
        let now_ms = frame as f64 * step_ms;
        if now_ms > deadline_ms {
            return Err(FlycartError::config(format!(
                "simulation did not settle within {deadline_ms} ms"
            )));
        }

        while (batches.len() as u32) < cfg.triggers
            && now_ms >= batches.len() as f64 * cfg.trigger_interval_ms
        {
            batches.push(orch.trigger(now_ms, &request)?.batch);
        }
        orch.tick(now_ms);

        if batches.len() as u32 == cfg.triggers && orch.is_idle() {
            tracing::debug!(now_ms, frames = frame + 1, "simulation settled");
            return Ok(SimulationReport {
                batches,
                events: orch.into_host().events,
                finished_ms: now_ms,
            });
        }
        frame += 1;
    }
}

// Last press, plus the stagger tail (under half a duration), plus one full flight. Two
// frames of slack cover press and completion both landing on the next tick.
fn settle_deadline_ms(cfg: &SimulationConfig) -> f64 {
    let last_press_ms = f64::from(cfg.triggers.saturating_sub(1)) * cfg.trigger_interval_ms;
    last_press_ms + cfg.flight.duration_ms * 1.5 + 2.0 * cfg.frame_interval_ms()
}

#[cfg(test)]
#[path = "../tests/unit/sim.rs"]
mod tests;
