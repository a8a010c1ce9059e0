use super::*;

#[test]
fn four_runs_over_one_second_start_125ms_apart() {
    assert_eq!(stagger_interval_ms(1000.0, 4), 125.0);
    let runs = stagger_schedule(0.0, 1000.0, 4);
    let starts: Vec<f64> = runs.iter().map(|r| r.start_ms).collect();
    assert_eq!(starts, vec![0.0, 125.0, 250.0, 375.0]);
    assert!(runs.iter().all(|r| r.state == RunState::Scheduled));
}

#[test]
fn single_run_has_no_stagger() {
    assert_eq!(stagger_interval_ms(600.0, 1), 0.0);
    let runs = stagger_schedule(40.0, 600.0, 1);
    assert_eq!(runs[0].start_ms, 40.0);
}

#[test]
fn run_starts_only_when_due() {
    let mut run = SubRun::new(1, 100.0);
    assert!(!run.start_if_due(99.0));
    assert_eq!(run.state, RunState::Scheduled);
    assert!(run.start_if_due(100.0));
    assert_eq!(run.state, RunState::Running);
}

#[test]
fn progress_reaches_exactly_one_at_duration() {
    let run = SubRun::new(0, 100.0);
    assert_eq!(run.progress_at(100.0, 600.0), 0.0);
    assert_eq!(run.progress_at(400.0, 600.0), 0.5);
    assert_eq!(run.progress_at(700.0, 600.0), 1.0);
    assert_eq!(run.progress_at(9000.0, 600.0), 1.0);
}

#[test]
fn advance_never_regresses() {
    let mut run = SubRun::new(0, 0.0);
    assert_eq!(run.advance(0.5), 0.5);
    assert_eq!(run.advance(0.25), 0.0);
    assert_eq!(run.progress, 0.5);
}

#[test]
fn complete_tops_up_and_is_terminal() {
    let mut run = SubRun::new(0, 0.0);
    run.start_if_due(0.0);
    run.advance(0.75);
    assert_eq!(run.complete(), Some(0.25));
    assert_eq!(run.state, RunState::Completed);
    assert_eq!(run.complete(), None);
    assert_eq!(run.advance(1.0), 0.0);
    assert!(!run.start_if_due(10_000.0));
}
