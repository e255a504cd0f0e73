// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn idle_only_advances_on_start_to_selecting() {
    assert!(SchedulerState::Idle.can_transition_to(SchedulerState::Selecting));
    assert!(!SchedulerState::Idle.can_transition_to(SchedulerState::Dispatching));
}

#[test]
fn selecting_forks_on_whether_a_feature_was_chosen() {
    assert!(SchedulerState::Selecting.can_transition_to(SchedulerState::Idle));
    assert!(SchedulerState::Selecting.can_transition_to(SchedulerState::Dispatching));
}

#[test]
fn awaiting_agent_forks_on_whether_verification_runs() {
    assert!(SchedulerState::AwaitingAgent.can_transition_to(SchedulerState::Verifying));
    assert!(SchedulerState::AwaitingAgent.can_transition_to(SchedulerState::Updating));
}

#[test]
fn any_active_state_can_pause_or_stop() {
    for state in [
        SchedulerState::Selecting,
        SchedulerState::Dispatching,
        SchedulerState::AwaitingAgent,
        SchedulerState::Verifying,
        SchedulerState::Updating,
    ] {
        assert!(state.can_transition_to(SchedulerState::Paused));
        assert!(state.can_transition_to(SchedulerState::Stopped));
    }
}

#[test]
fn stopped_cannot_pause_but_stays_stopped() {
    assert!(!SchedulerState::Stopped.can_transition_to(SchedulerState::Paused));
    assert!(SchedulerState::Stopped.can_transition_to(SchedulerState::Stopped));
}

#[test]
fn paused_resumes_into_selecting() {
    assert!(SchedulerState::Paused.can_transition_to(SchedulerState::Selecting));
}

#[test]
fn any_non_stopped_state_can_fault_into_error() {
    for state in [
        SchedulerState::Idle,
        SchedulerState::Selecting,
        SchedulerState::Dispatching,
        SchedulerState::AwaitingAgent,
        SchedulerState::Verifying,
        SchedulerState::Updating,
        SchedulerState::Paused,
    ] {
        assert!(state.can_transition_to(SchedulerState::Error));
    }
    assert!(!SchedulerState::Stopped.can_transition_to(SchedulerState::Error));
}

#[test]
fn is_in_flight_matches_the_three_controller_gated_states() {
    assert!(SchedulerState::Dispatching.is_in_flight());
    assert!(SchedulerState::AwaitingAgent.is_in_flight());
    assert!(SchedulerState::Verifying.is_in_flight());
    assert!(!SchedulerState::Selecting.is_in_flight());
    assert!(!SchedulerState::Updating.is_in_flight());
}
