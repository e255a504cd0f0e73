// SPDX-License-Identifier: MIT

//! Event entity (§3, §6): the immutable record broadcast on the EventBus and
//! retained in the Store's per-project ring buffer.

use crate::feature::{FeatureState, SourceSpec};
use crate::ids::{FeatureId, RunId, SessionId, SpecUpdateAnalysisId};
use crate::project::ProjectState;
use crate::run::RunOutcome;
use crate::slug::ProjectSlug;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind-dependent payload of an [`Event`] (§6 "Event schema (wire)").
///
/// One variant per kind named in §6; `#[serde(tag = "kind")]` makes `kind`
/// and `payload` collapse into a single tagged object on the wire, matching
/// the teacher's `oj-core::Event` encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    ProjectStateChanged { from: ProjectState, to: ProjectState },
    /// Carries the full feature record (not just its id) so WAL replay can
    /// rebuild `MaterializedState` without any side channel (§4.1 recovery).
    FeatureCreated { feature: crate::feature::Feature },
    /// Carries a full snapshot of the feature's mutable fields, not just
    /// `from`/`to`, so replay can also reconstruct content edits made by the
    /// spec-update apply workflow (§4.5) without a second event kind.
    FeatureTransitioned {
        feature_id: FeatureId,
        from: FeatureState,
        to: FeatureState,
        passes: bool,
        needs_review: bool,
        retry_count: u32,
        category: String,
        name: String,
        description: String,
        steps: Vec<String>,
    },
    /// Carries the full initial run record, for the same replay reason as
    /// `FeatureCreated`.
    RunStarted { run: crate::run::Run },
    RunFinished { run_id: RunId, feature_id: FeatureId, outcome: RunOutcome, exit_code: Option<i32> },
    AgentLine { session_id: SessionId, line: String },
    AgentHeartbeat { session_id: SessionId, feature_id: Option<FeatureId>, recent_lines: Vec<String> },
    SpecGenerated { feature_count: usize },
    /// `app_spec` is the full replacement text, so replay can reconstruct
    /// `Project::app_spec`; `summary` is the UI-facing reconciliation note
    /// (§4.5 "every apply emits a spec_updated event with a summary").
    /// `analysis_id` is the analysis this apply was approved against, so
    /// replay can rebuild the applied-analyses set that makes a repeated
    /// apply of the same analysis a no-op (§8 property 7).
    SpecUpdated { summary: String, app_spec: String, analysis_id: SpecUpdateAnalysisId },
    ReferenceAdded { reference_session_id: crate::ids::ReferenceSessionId, component_count: usize },
    SchedulerStateChanged { from: String, to: String },
    Error { message: String },
    /// Terminal event sent to a disconnected lagged subscriber (§4.2).
    Lagged { last_delivered_seq: u64 },
}

impl EventKind {
    /// The wire tag, matching §6's kind list exactly.
    pub fn tag(&self) -> &'static str {
        match self {
            EventKind::ProjectStateChanged { .. } => "project_state_changed",
            EventKind::FeatureCreated { .. } => "feature_created",
            EventKind::FeatureTransitioned { .. } => "feature_transitioned",
            EventKind::RunStarted { .. } => "run_started",
            EventKind::RunFinished { .. } => "run_finished",
            EventKind::AgentLine { .. } => "agent_line",
            EventKind::AgentHeartbeat { .. } => "agent_heartbeat",
            EventKind::SpecGenerated { .. } => "spec_generated",
            EventKind::SpecUpdated { .. } => "spec_updated",
            EventKind::ReferenceAdded { .. } => "reference_added",
            EventKind::SchedulerStateChanged { .. } => "scheduler_state_changed",
            EventKind::Error { .. } => "error",
            EventKind::Lagged { .. } => "lagged",
        }
    }
}

/// An immutable record broadcast on the EventBus (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub project: ProjectSlug,
    pub seq: u64,
    #[serde(flatten)]
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(project: ProjectSlug, seq: u64, kind: EventKind, timestamp: DateTime<Utc>) -> Self {
        Self { project, seq, kind, timestamp }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
