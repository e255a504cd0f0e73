// SPDX-License-Identifier: MIT

//! Per-scheduler scheduling options (§4.4 "Inputs").

use foreman_core::AgentRole;
use std::collections::HashMap;
use std::time::Duration;

/// Scheduling options, one set per [`crate::scheduler::FeatureScheduler`]
/// instance (i.e. per project).
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// §4.4 "Yolo mode": skip verification, never flag `needs_review`.
    pub yolo: bool,
    /// Overrides `Config::default_coding_timeout_s` for this project's
    /// coding sessions, if set.
    pub feature_timeout_override: Option<Duration>,
    /// Model to request per role, passed through to `AgentSession::start`.
    pub model_per_role: HashMap<AgentRole, String>,
    /// How often a heartbeat event is emitted for the in-progress feature
    /// (§4.4 "Events emitted", default 5s).
    pub heartbeat_s: u64,
    /// How many of the most recently completed features to summarize into
    /// the dispatch prompt (§4.4 "Dispatch", default 5).
    pub recent_summary_budget: usize,
    /// Bound on the verification hook's own runtime (§6, default 2 min).
    pub verification_timeout_s: u64,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            yolo: false,
            feature_timeout_override: None,
            model_per_role: HashMap::new(),
            heartbeat_s: 5,
            recent_summary_budget: 5,
            verification_timeout_s: 120,
        }
    }
}
