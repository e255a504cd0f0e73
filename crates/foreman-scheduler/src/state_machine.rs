// SPDX-License-Identifier: MIT

//! The scheduler's internal state machine (§4.4).

use foreman_core::FeatureId;
use serde::{Deserialize, Serialize};

/// Internal scheduler state (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    Selecting,
    Dispatching,
    AwaitingAgent,
    Verifying,
    Updating,
    Paused,
    Stopped,
    Error,
}

foreman_core::simple_display! {
    SchedulerState {
        Idle => "idle",
        Selecting => "selecting",
        Dispatching => "dispatching",
        AwaitingAgent => "awaiting_agent",
        Verifying => "verifying",
        Updating => "updating",
        Paused => "paused",
        Stopped => "stopped",
        Error => "error",
    }
}

impl SchedulerState {
    /// True while a feature is actively being worked, per §4.6's
    /// `apply_spec_update` gate ("rejected while the scheduler is
    /// dispatching/awaiting_agent/verifying").
    pub fn is_in_flight(self) -> bool {
        matches!(self, SchedulerState::Dispatching | SchedulerState::AwaitingAgent | SchedulerState::Verifying)
    }

    pub fn can_transition_to(self, target: SchedulerState) -> bool {
        use SchedulerState::*;
        match (self, target) {
            (Idle, Selecting) => true,
            (Selecting, Idle) => true,
            (Selecting, Dispatching) => true,
            (Dispatching, AwaitingAgent) => true,
            (AwaitingAgent, Verifying) => true,
            (AwaitingAgent, Updating) => true,
            (Verifying, Updating) => true,
            (Updating, Selecting) => true,
            (Updating, Error) => true,
            (Paused, Selecting) => true,
            (_, Paused) if self != Stopped && self != Error => true,
            (_, Stopped) if self != Stopped => true,
            (_, Error) if self != Stopped => true,
            (a, b) if a == b => true,
            _ => false,
        }
    }
}

/// Snapshot of scheduler progress, returned by [`crate::scheduler::FeatureScheduler::status`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub current_feature: Option<FeatureId>,
}

#[cfg(test)]
#[path = "state_machine_tests.rs"]
mod tests;
