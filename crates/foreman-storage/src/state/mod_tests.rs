// SPDX-License-Identifier: MIT

use super::*;
use foreman_core::{Feature, ProjectSlug, RunOutcome};
use std::path::PathBuf;

fn ts() -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(1000).unwrap_or_default()
}

#[test]
fn apply_feature_created_is_idempotent() {
    let mut state = MaterializedState::new(100);
    let feature = Feature::new(FeatureId::new(1), "core", "login");
    let event = Event::new(ProjectSlug::test("demo"), 1, EventKind::FeatureCreated { feature: feature.clone() }, ts());

    state.apply_event(&event);
    state.apply_event(&event);

    assert_eq!(state.features.len(), 1);
    assert_eq!(state.next_feature_id, 2);
}

#[test]
fn apply_run_finished_updates_feature_last_run() {
    let mut state = MaterializedState::new(100);
    let feature = Feature::new(FeatureId::new(1), "core", "login");
    state.apply_event(&Event::new(
        ProjectSlug::test("demo"),
        1,
        EventKind::FeatureCreated { feature },
        ts(),
    ));

    let run = Run::start(RunId::new(), FeatureId::new(1), 1000, PathBuf::from("/tmp/r.out"));
    let run_id = run.id;
    state.apply_event(&Event::new(ProjectSlug::test("demo"), 2, EventKind::RunStarted { run }, ts()));
    state.apply_event(&Event::new(
        ProjectSlug::test("demo"),
        3,
        EventKind::RunFinished { run_id, feature_id: FeatureId::new(1), outcome: RunOutcome::Success, exit_code: Some(0) },
        ts(),
    ));

    assert_eq!(state.get_feature(&FeatureId::new(1)).unwrap().last_run, Some(run_id));
    assert!(state.get_run(&run_id).unwrap().is_finished());
}

#[test]
fn allocate_feature_id_increments() {
    let mut state = MaterializedState::new(100);
    let a = state.allocate_feature_id();
    let b = state.allocate_feature_id();
    assert_eq!(a, FeatureId::new(1));
    assert_eq!(b, FeatureId::new(2));
}

#[test]
fn event_ring_retains_every_applied_event() {
    let mut state = MaterializedState::new(100);
    for seq in 1..=3u64 {
        state.apply_event(&Event::new(
            ProjectSlug::test("demo"),
            seq,
            EventKind::Error { message: "x".into() },
            ts(),
        ));
    }
    assert_eq!(state.events.len(), 3);
}
