// SPDX-License-Identifier: MIT

//! Pure update-rule logic (§4.4 "Update rules" and "Retry policy").

use crate::verification::VerificationOutcome;
use foreman_core::{FeatureState, RunOutcome};

/// Everything the update rule needs to know about the feature and session
/// that just finished.
#[derive(Debug, Clone)]
pub struct RetryInput {
    pub outcome: RunOutcome,
    /// `None` when verification was skipped (outcome wasn't success/failed).
    pub verification: Option<VerificationOutcome>,
    pub prior_passes: bool,
    pub prior_retry_count: u32,
    pub yolo: bool,
    pub retry_cap: u32,
    /// Only relevant to `Cancelled`: whether a `resume` (vs. a `pause`/`stop`)
    /// caused the cancellation (§4.4 update rules, `cancelled` row).
    pub resume_caused_cancel: bool,
}

/// What the scheduler should do to the feature and whether it should keep
/// looping (§4.4 "Update rules").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryDecision {
    pub target_state: FeatureState,
    pub passes: bool,
    pub retry_count: u32,
    pub needs_review: bool,
    pub continue_scheduling: bool,
    /// Set when the scheduler itself must transition to `error` (the
    /// `session outcome = error` row).
    pub scheduler_errors: bool,
}

/// A session/verification outcome that counts against the feature's retry
/// budget: pending again, retry counter bumped, `needs_review` set once the
/// cap is reached (§4.4 "Retry policy"). The scheduler still advances to the
/// next pending feature either way — the cap surfaces a stuck feature for
/// operator review without stalling the rest of the project.
fn retry_again(input: &RetryInput) -> RetryDecision {
    if input.yolo {
        return RetryDecision {
            target_state: FeatureState::Pending,
            passes: false,
            retry_count: input.prior_retry_count,
            needs_review: false,
            continue_scheduling: true,
            scheduler_errors: false,
        };
    }
    let retry_count = input.prior_retry_count + 1;
    let needs_review = retry_count >= input.retry_cap;
    RetryDecision {
        target_state: FeatureState::Pending,
        passes: false,
        retry_count,
        needs_review,
        continue_scheduling: true,
        scheduler_errors: false,
    }
}

/// Apply the update-rule table (§4.4) to one finished run.
pub fn decide(input: RetryInput) -> RetryDecision {
    match input.outcome {
        RunOutcome::Success => {
            let passed = input.yolo || input.verification.as_ref().is_some_and(|v| v.passes);
            if passed {
                RetryDecision {
                    target_state: FeatureState::Done,
                    passes: true,
                    retry_count: input.prior_retry_count,
                    needs_review: false,
                    continue_scheduling: true,
                    scheduler_errors: false,
                }
            } else {
                retry_again(&input)
            }
        }
        RunOutcome::Failed => retry_again(&input),
        RunOutcome::Timeout => retry_again(&input),
        RunOutcome::Cancelled => RetryDecision {
            target_state: FeatureState::Pending,
            passes: input.prior_passes,
            retry_count: input.prior_retry_count,
            needs_review: false,
            continue_scheduling: input.resume_caused_cancel,
            scheduler_errors: false,
        },
        RunOutcome::Error => RetryDecision {
            target_state: FeatureState::Pending,
            passes: false,
            retry_count: input.prior_retry_count,
            needs_review: false,
            continue_scheduling: false,
            scheduler_errors: true,
        },
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
