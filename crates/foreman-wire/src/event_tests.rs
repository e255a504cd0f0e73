// SPDX-License-Identifier: MIT

use super::*;
use chrono::Utc;
use foreman_core::{Event, EventKind, FeatureId, ProjectSlug, ProjectState};

#[test]
fn project_state_changed_round_trips_through_the_wire_tag() {
    let event = Event::new(
        ProjectSlug::test("demo"),
        1,
        EventKind::ProjectStateChanged { from: ProjectState::Draft, to: ProjectState::SpecReady },
        Utc::now(),
    );
    let wire = WireEvent::from(&event);
    let json = serde_json::to_value(&wire).unwrap();
    assert_eq!(json["kind"], "project_state_changed");
    assert_eq!(json["from"], "draft");
    assert_eq!(json["to"], "spec_ready");

    let decoded: WireEvent = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, wire);
}

#[test]
fn feature_transitioned_carries_content_fields() {
    let event = Event::new(
        ProjectSlug::test("demo"),
        2,
        EventKind::FeatureTransitioned {
            feature_id: FeatureId::new(1),
            from: foreman_core::FeatureState::Pending,
            to: foreman_core::FeatureState::InProgress,
            passes: false,
            needs_review: false,
            retry_count: 0,
            category: "auth".to_string(),
            name: "sign in".to_string(),
            description: "let a user sign in".to_string(),
            steps: vec!["click sign in".to_string()],
        },
        Utc::now(),
    );
    let wire = WireEvent::from(&event);
    match wire.kind {
        WireEventKind::FeatureTransitioned { name, to, .. } => {
            assert_eq!(name, "sign in");
            assert_eq!(to, foreman_core::FeatureState::InProgress);
        }
        other => panic!("unexpected kind: {other:?}"),
    }
}

#[test]
fn scheduler_state_changed_preserves_raw_strings() {
    let event = Event::new(
        ProjectSlug::test("demo"),
        3,
        EventKind::SchedulerStateChanged { from: "selecting".to_string(), to: "idle".to_string() },
        Utc::now(),
    );
    let wire = WireEvent::from(&event);
    assert!(matches!(wire.kind, WireEventKind::SchedulerStateChanged { to, .. } if to == "idle"));
}
