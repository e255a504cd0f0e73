// SPDX-License-Identifier: MIT

use super::*;
use crate::verification::VerificationOutcome;

fn base() -> RetryInput {
    RetryInput {
        outcome: RunOutcome::Success,
        verification: Some(VerificationOutcome::passed("ok")),
        prior_passes: false,
        prior_retry_count: 0,
        yolo: false,
        retry_cap: 3,
        resume_caused_cancel: false,
    }
}

#[test]
fn success_with_passing_verification_marks_feature_done() {
    let decision = decide(base());
    assert_eq!(decision.target_state, FeatureState::Done);
    assert!(decision.passes);
    assert!(decision.continue_scheduling);
    assert!(!decision.scheduler_errors);
}

#[test]
fn success_with_failing_verification_goes_pending_and_retries() {
    let input = RetryInput { verification: Some(VerificationOutcome::failed("nope")), ..base() };
    let decision = decide(input);
    assert_eq!(decision.target_state, FeatureState::Pending);
    assert!(!decision.passes);
    assert_eq!(decision.retry_count, 1);
    assert!(!decision.needs_review);
    assert!(decision.continue_scheduling);
}

#[test]
fn failed_session_skips_verification_and_retries() {
    let input = RetryInput { outcome: RunOutcome::Failed, verification: None, ..base() };
    let decision = decide(input);
    assert_eq!(decision.target_state, FeatureState::Pending);
    assert_eq!(decision.retry_count, 1);
    assert!(decision.continue_scheduling);
}

#[test]
fn retry_cap_reached_flags_needs_review_but_still_continues() {
    let input = RetryInput {
        outcome: RunOutcome::Failed,
        verification: None,
        prior_retry_count: 2,
        retry_cap: 3,
        ..base()
    };
    let decision = decide(input);
    assert_eq!(decision.retry_count, 3);
    assert!(decision.needs_review);
    assert!(decision.continue_scheduling);
}

#[test]
fn timeout_retries_like_a_failure() {
    let input = RetryInput { outcome: RunOutcome::Timeout, verification: None, ..base() };
    let decision = decide(input);
    assert_eq!(decision.target_state, FeatureState::Pending);
    assert_eq!(decision.retry_count, 1);
    assert!(decision.continue_scheduling);
}

#[test]
fn cancelled_preserves_prior_passes_and_only_continues_on_resume() {
    let input = RetryInput {
        outcome: RunOutcome::Cancelled,
        verification: None,
        prior_passes: true,
        resume_caused_cancel: false,
        ..base()
    };
    let decision = decide(input.clone());
    assert_eq!(decision.target_state, FeatureState::Pending);
    assert!(decision.passes);
    assert!(!decision.continue_scheduling);

    let resumed = RetryInput { resume_caused_cancel: true, ..input };
    assert!(decide(resumed).continue_scheduling);
}

#[test]
fn error_outcome_halts_the_scheduler() {
    let input = RetryInput { outcome: RunOutcome::Error, verification: None, ..base() };
    let decision = decide(input);
    assert!(!decision.continue_scheduling);
    assert!(decision.scheduler_errors);
}

#[test]
fn yolo_mode_ignores_verification_and_never_flags_review() {
    let input = RetryInput {
        outcome: RunOutcome::Success,
        verification: Some(VerificationOutcome::failed("would normally fail")),
        yolo: true,
        ..base()
    };
    let decision = decide(input);
    assert_eq!(decision.target_state, FeatureState::Done);
    assert!(decision.passes);
}

#[test]
fn yolo_mode_disables_retry_counters_on_failure() {
    let input = RetryInput { outcome: RunOutcome::Failed, verification: None, yolo: true, prior_retry_count: 2, ..base() };
    let decision = decide(input);
    assert_eq!(decision.retry_count, 2);
    assert!(!decision.needs_review);
}
