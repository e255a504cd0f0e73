// SPDX-License-Identifier: MIT

use super::*;
use crate::run::Run;
use crate::slug::ProjectSlug;
use std::path::PathBuf;

fn ts() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000).unwrap()
}

#[test]
fn tag_matches_wire_kind_list() {
    assert_eq!(EventKind::FeatureTransitioned {
        feature_id: FeatureId::new(1),
        from: FeatureState::Pending,
        to: FeatureState::InProgress,
        passes: false,
        needs_review: false,
        retry_count: 0,
        category: "core".into(),
        name: "f1".into(),
        description: String::new(),
        steps: Vec::new(),
    }.tag(), "feature_transitioned");
    assert_eq!(EventKind::Lagged { last_delivered_seq: 9 }.tag(), "lagged");
}

#[test]
fn event_round_trips_through_json() {
    let run = Run::start(RunId::new(), FeatureId::new(3), 1000, PathBuf::from("/tmp/run.out"));
    let event = Event::new(ProjectSlug::test("demo"), 7, EventKind::RunStarted { run }, ts());
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"kind\":\"run_started\""));
    let back: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);
}

#[test]
fn project_state_changed_serializes_tagged() {
    let kind = EventKind::ProjectStateChanged { from: ProjectState::Draft, to: ProjectState::SpecReady };
    let json = serde_json::to_string(&kind).unwrap();
    assert!(json.contains("\"kind\":\"project_state_changed\""));
    assert!(json.contains("\"from\":\"draft\""));
}
