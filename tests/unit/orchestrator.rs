use super::*;
use crate::animation::bezier::CubicBezier;
use crate::batch::store::PROGRESS_STEP;
use crate::host::{HostEvent, RecordingHost};

fn request(count: u32, duration_ms: f64) -> FlightRequest {
    FlightRequest {
        count,
        duration_ms,
        ..FlightRequest::new(
            Geometry::new(0.0, 0.0, 40.0, 40.0),
            Geometry::new(400.0, 20.0, 30.0, 30.0),
        )
    }
}

fn external(count: u32) -> FlightRequest {
    FlightRequest {
        driver: Driver::External,
        ..request(count, 600.0)
    }
}

fn run_until_idle(orch: &mut Orchestrator<RecordingHost>, step_ms: f64) -> f64 {
    let mut now = 0.0;
    for _ in 0..10_000 {
        orch.tick(now);
        if orch.is_idle() {
            return now;
        }
        now += step_ms;
    }
    panic!("orchestrator never went idle");
}

#[derive(Default)]
struct FailingHost {
    progress_calls: usize,
    complete_calls: usize,
}

impl FlightHost for FailingHost {
    fn on_before_trigger(&mut self) -> anyhow::Result<()> {
        anyhow::bail!("before failed")
    }

    fn on_progress(&mut self, _batch: BatchId, _progress: f64) -> anyhow::Result<()> {
        self.progress_calls += 1;
        anyhow::bail!("progress failed")
    }

    fn on_batch_complete(&mut self, _batch: BatchId) -> anyhow::Result<()> {
        self.complete_calls += 1;
        anyhow::bail!("complete failed")
    }
}

#[test]
fn invalid_input_is_rejected_before_any_batch_exists() {
    let mut orch = Orchestrator::new(RecordingHost::new());

    assert!(orch.trigger(0.0, &request(0, 600.0)).is_err());
    assert!(orch.trigger(0.0, &request(1, 0.0)).is_err());
    assert!(orch.trigger(0.0, &request(1, f64::NAN)).is_err());

    let mut bad_geometry = request(1, 600.0);
    bad_geometry.source.left = f64::INFINITY;
    assert!(orch.trigger(0.0, &bad_geometry).is_err());

    let mut bad_easing = request(1, 600.0);
    bad_easing.easings.y = CubicBezier {
        x1: 2.0,
        ..CubicBezier::EASE
    };
    assert!(matches!(
        orch.trigger(0.0, &bad_easing),
        Err(FlycartError::Validation(_))
    ));

    assert!(orch.host().events.is_empty());
    assert!(orch.is_idle());

    let launch = orch.trigger(0.0, &request(1, 600.0)).unwrap();
    assert_eq!(launch.batch, BatchId(1));
}

#[test]
fn out_of_order_completions_resolve_once() {
    let mut orch = Orchestrator::new(RecordingHost::new());
    let b1 = orch.trigger(0.0, &external(3)).unwrap().batch;

    orch.report_completion(b1, 1);
    orch.report_completion(b1, 2);
    assert!(orch.has_batch(b1));
    assert_eq!(orch.host().completions_of(b1), 0);

    orch.report_completion(b1, 0);
    assert!(!orch.has_batch(b1));
    assert_eq!(orch.host().completions_of(b1), 1);
}

#[test]
fn every_completion_order_reaches_the_same_state() {
    let perms = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];
    for order in perms {
        let mut orch = Orchestrator::new(RecordingHost::new());
        let b = orch.trigger(0.0, &external(3)).unwrap().batch;
        for i in order {
            orch.report_completion(b, i);
        }
        assert!(!orch.has_batch(b), "order {order:?}");
        assert_eq!(orch.host().completions_of(b), 1, "order {order:?}");
        assert_eq!(orch.host().progress_of(b).last(), Some(&1.0));
    }
}

#[test]
fn duplicate_and_late_completions_are_ignored() {
    let mut orch = Orchestrator::new(RecordingHost::new());
    let b = orch.trigger(0.0, &external(2)).unwrap().batch;

    orch.report_completion(b, 0);
    orch.report_completion(b, 0);
    assert!(orch.has_batch(b));

    orch.report_completion(b, 1);
    orch.report_completion(b, 1);
    orch.report_completion(b, 7);
    orch.report_completion(BatchId(99), 0);
    assert_eq!(orch.host().completions_of(b), 1);
}

#[test]
fn external_progress_feeds_the_aggregate() {
    let mut orch = Orchestrator::new(RecordingHost::new());
    let b = orch.trigger(0.0, &external(2)).unwrap().batch;

    orch.report_progress(b, 0, 0.5);
    orch.report_progress(b, 1, 0.5);
    orch.report_progress(b, 1, 0.25);
    assert_eq!(orch.host().progress_of(b), vec![0.25, 0.5]);
    assert_eq!(
        orch.run_states(b),
        Some(vec![RunState::Running, RunState::Running])
    );

    orch.report_progress(b, 0, 1.0);
    assert_eq!(
        orch.run_states(b),
        Some(vec![RunState::Completed, RunState::Running])
    );
    orch.report_completion(b, 1);
    assert_eq!(orch.host().progress_of(b), vec![0.25, 0.5, 0.75, 1.0]);
    assert_eq!(orch.host().completions_of(b), 1);
}

#[test]
fn internal_runs_follow_the_stagger_schedule() {
    let mut orch = Orchestrator::new(RecordingHost::new());
    let launch = orch.trigger(0.0, &request(4, 1000.0)).unwrap();
    assert_eq!(launch.starts_ms, vec![0.0, 125.0, 250.0, 375.0]);
    assert!(launch.animated);

    orch.tick(0.0);
    assert_eq!(
        orch.run_states(launch.batch),
        Some(vec![
            RunState::Running,
            RunState::Scheduled,
            RunState::Scheduled,
            RunState::Scheduled
        ])
    );
    orch.tick(124.0);
    assert_eq!(orch.run_states(launch.batch).unwrap()[1], RunState::Scheduled);
    orch.tick(125.0);
    assert_eq!(orch.run_states(launch.batch).unwrap()[1], RunState::Running);
}

#[test]
fn internal_progress_is_monotonic_bounded_and_terminal() {
    let mut orch = Orchestrator::new(RecordingHost::new());
    let b = orch.trigger(0.0, &request(4, 1000.0)).unwrap().batch;
    let finished_at = run_until_idle(&mut orch, 16.0);
    assert!(finished_at >= 1375.0);

    let progress = orch.host().progress_of(b);
    assert!(!progress.is_empty());
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert!(progress.iter().all(|p| (0.0..=1.0).contains(p)));
    assert!((progress.last().unwrap() - 1.0).abs() < 1e-9);
    assert_eq!(orch.host().completions_of(b), 1);
    assert_eq!(
        orch.host().events.last(),
        Some(&HostEvent::BatchComplete { batch: b })
    );
}

#[test]
fn progress_pushes_are_throttled() {
    let mut orch = Orchestrator::new(RecordingHost::new());
    let b = orch.trigger(0.0, &request(1, 1000.0)).unwrap().batch;
    run_until_idle(&mut orch, 1.0);

    let progress = orch.host().progress_of(b);
    assert!(progress.len() <= 101, "pushed {} times", progress.len());
    let (terminal, rest) = progress.split_last().unwrap();
    assert!(rest.windows(2).all(|w| w[1] - w[0] > PROGRESS_STEP));
    assert_eq!(*terminal, 1.0);
}

#[test]
fn frames_are_emitted_for_visible_runs() {
    let mut orch = Orchestrator::new(RecordingHost::with_frames());
    let b = orch.trigger(0.0, &request(1, 100.0)).unwrap().batch;
    for now in [0.0, 50.0, 100.0] {
        orch.tick(now);
    }
    let frames = orch.host().frames_of(b);
    let progress: Vec<f64> = frames.iter().map(|f| f.progress).collect();
    assert_eq!(progress, vec![0.0, 0.5, 1.0]);
    assert_eq!(frames[2].sample.position, kurbo::Point::new(415.0, 35.0));
}

#[test]
fn zero_area_source_completes_without_flight() {
    let mut orch = Orchestrator::new(RecordingHost::with_frames());
    let mut req = request(1, 600.0);
    req.source.width = 0.0;

    let launch = orch.trigger(0.0, &req).unwrap();
    assert!(!launch.animated);
    assert_eq!(
        orch.host().events,
        vec![
            HostEvent::BeforeTrigger,
            HostEvent::Progress {
                batch: launch.batch,
                progress: 1.0
            },
            HostEvent::BatchComplete {
                batch: launch.batch
            },
        ]
    );
    assert!(orch.is_idle());
}

#[test]
fn reduced_motion_keeps_the_progress_contract() {
    let mut orch = Orchestrator::new(RecordingHost::with_frames());
    let req = FlightRequest {
        reduced_motion: true,
        ..request(3, 600.0)
    };
    let b = orch.trigger(0.0, &req).unwrap().batch;

    let progress = orch.host().progress_of(b);
    assert_eq!(progress.len(), 3);
    assert!((progress[0] - 1.0 / 3.0).abs() < 1e-12);
    assert!((progress[1] - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(progress[2], 1.0);
    assert_eq!(orch.host().completions_of(b), 1);
    assert!(orch.host().frames_of(b).is_empty());
}

#[test]
fn rapid_triggers_track_batches_independently() {
    let mut orch = Orchestrator::new(RecordingHost::new());
    let b1 = orch.trigger(0.0, &external(1)).unwrap().batch;
    let b2 = orch.trigger(1.0, &external(1)).unwrap().batch;
    assert_ne!(b1, b2);

    orch.report_completion(b1, 0);
    assert!(!orch.has_batch(b1));
    assert!(orch.has_batch(b2));
    assert_eq!(orch.host().completions_of(b2), 0);
    assert_eq!(orch.run_states(b2), Some(vec![RunState::Scheduled]));
}

#[test]
fn dispose_silences_in_flight_batches() {
    let mut orch = Orchestrator::new(RecordingHost::new());
    let b = orch.trigger(0.0, &request(2, 600.0)).unwrap().batch;
    orch.tick(0.0);
    orch.tick(200.0);
    let before = orch.host().events.len();

    orch.dispose();
    orch.tick(400.0);
    orch.tick(5000.0);
    orch.report_completion(b, 0);
    assert_eq!(orch.host().events.len(), before);
    assert_eq!(orch.host().completions_of(b), 0);
    assert!(!orch.has_batch(b));
    assert!(matches!(
        orch.trigger(6000.0, &request(1, 600.0)),
        Err(FlycartError::Disposed)
    ));
}

#[test]
fn host_failures_do_not_corrupt_accounting() {
    let mut orch = Orchestrator::new(FailingHost::default());
    let b1 = orch.trigger(0.0, &external(2)).unwrap().batch;
    let b2 = orch.trigger(0.0, &external(1)).unwrap().batch;

    orch.report_completion(b1, 0);
    orch.report_completion(b1, 1);
    orch.report_completion(b2, 0);

    assert!(orch.is_idle());
    assert_eq!(orch.host().complete_calls, 2);
    assert_eq!(orch.host().progress_calls, 3);
}

#[test]
fn reports_for_internal_batches_are_ignored() {
    let mut orch = Orchestrator::new(RecordingHost::new());
    let b = orch.trigger(0.0, &request(1, 600.0)).unwrap().batch;
    orch.report_completion(b, 0);
    orch.report_progress(b, 0, 0.5);
    assert!(orch.has_batch(b));
    assert!(orch.host().progress_of(b).is_empty());
}

#[test]
fn zero_area_destination_completes_without_flight() {
    let mut orch = Orchestrator::new(RecordingHost::with_frames());
    let mut req = request(2, 600.0);
    req.destination.height = 0.0;

    let launch = orch.trigger(0.0, &req).unwrap();
    assert!(!launch.animated);
    assert!(orch.is_idle());
    assert_eq!(orch.host().progress_of(launch.batch).last(), Some(&1.0));
    assert_eq!(orch.host().completions_of(launch.batch), 1);
    assert!(orch.host().frames_of(launch.batch).is_empty());

    orch.tick(1_000.0);
    assert_eq!(orch.host().completions_of(launch.batch), 1);
}

#[test]
fn earlier_tick_does_not_rewind_progress() {
    let mut orch = Orchestrator::new(RecordingHost::with_frames());
    let b = orch.trigger(0.0, &request(1, 1000.0)).unwrap().batch;
    for now in [0.0, 500.0, 200.0, 600.0] {
        orch.tick(now);
    }

    let progress = orch.host().progress_of(b);
    assert_eq!(progress.len(), 2);
    assert!((progress[0] - 0.5).abs() < 1e-12);
    assert!((progress[1] - 0.6).abs() < 1e-12);

    let frames: Vec<f64> = orch.host().frames_of(b).iter().map(|f| f.progress).collect();
    assert_eq!(frames, vec![0.0, 0.5, 0.5, 0.6]);
}

// Panics out of `on_progress` while armed.
struct UnwindingHost {
    armed: bool,
    completions: usize,
}

impl FlightHost for UnwindingHost {
    fn on_progress(&mut self, _batch: BatchId, _progress: f64) -> anyhow::Result<()> {
        if self.armed {
            panic!("progress handler panicked");
        }
        Ok(())
    }

    fn on_batch_complete(&mut self, _batch: BatchId) -> anyhow::Result<()> {
        self.completions += 1;
        Ok(())
    }
}

#[test]
fn unwinding_host_cannot_strand_a_batch() {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    let mut orch = Orchestrator::new(UnwindingHost {
        armed: true,
        completions: 0,
    });
    let b = orch.trigger(0.0, &external(2)).unwrap().batch;

    let unwound = catch_unwind(AssertUnwindSafe(|| orch.report_completion(b, 0))).is_err();
    assert!(unwound);
    assert_eq!(
        orch.run_states(b),
        Some(vec![RunState::Completed, RunState::Scheduled])
    );

    orch.host_mut().armed = false;
    orch.report_completion(b, 0);
    orch.report_completion(b, 1);
    assert!(!orch.has_batch(b));
    assert_eq!(orch.host().completions, 1);

    // The last completion is counted even when the final progress push unwinds.
    orch.host_mut().armed = true;
    let b = orch.trigger(0.0, &external(1)).unwrap().batch;
    let unwound = catch_unwind(AssertUnwindSafe(|| orch.report_completion(b, 0))).is_err();
    assert!(unwound);
    assert!(!orch.has_batch(b));
    assert!(orch.is_idle());
}
