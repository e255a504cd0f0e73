// SPDX-License-Identifier: MIT

//! The wire `Event` schema (§6): a self-describing, tagged-variant
//! projection of [`foreman_core::Event`] for the external (HTTP/WebSocket)
//! boundary, kept separate from the internal representation so the latter
//! can evolve without breaking consumers.

use chrono::{DateTime, Utc};
use foreman_core::{
    Feature, FeatureId, FeatureState, ProjectSlug, ProjectState, ReferenceSessionId, Run, RunId,
    RunOutcome, SessionId, SpecUpdateAnalysisId,
};
use serde::{Deserialize, Serialize};

/// The kind-dependent payload of a [`WireEvent`] (§6 "Event schema (wire)").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WireEventKind {
    ProjectStateChanged { from: ProjectState, to: ProjectState },
    FeatureCreated { feature: Feature },
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
    RunStarted { run: Run },
    RunFinished { run_id: RunId, feature_id: FeatureId, outcome: RunOutcome, exit_code: Option<i32> },
    AgentLine { session_id: SessionId, line: String },
    AgentHeartbeat { session_id: SessionId, feature_id: Option<FeatureId>, recent_lines: Vec<String> },
    SpecGenerated { feature_count: usize },
    SpecUpdated { summary: String, app_spec: String, analysis_id: SpecUpdateAnalysisId },
    ReferenceAdded { reference_session_id: ReferenceSessionId, component_count: usize },
    SchedulerStateChanged { from: String, to: String },
    Error { message: String },
    Lagged { last_delivered_seq: u64 },
}

impl From<&foreman_core::EventKind> for WireEventKind {
    fn from(kind: &foreman_core::EventKind) -> Self {
        use foreman_core::EventKind as K;
        match kind.clone() {
            K::ProjectStateChanged { from, to } => Self::ProjectStateChanged { from, to },
            K::FeatureCreated { feature } => Self::FeatureCreated { feature },
            K::FeatureTransitioned {
                feature_id,
                from,
                to,
                passes,
                needs_review,
                retry_count,
                category,
                name,
                description,
                steps,
            } => Self::FeatureTransitioned {
                feature_id,
                from,
                to,
                passes,
                needs_review,
                retry_count,
                category,
                name,
                description,
                steps,
            },
            K::RunStarted { run } => Self::RunStarted { run },
            K::RunFinished { run_id, feature_id, outcome, exit_code } => {
                Self::RunFinished { run_id, feature_id, outcome, exit_code }
            }
            K::AgentLine { session_id, line } => Self::AgentLine { session_id, line },
            K::AgentHeartbeat { session_id, feature_id, recent_lines } => {
                Self::AgentHeartbeat { session_id, feature_id, recent_lines }
            }
            K::SpecGenerated { feature_count } => Self::SpecGenerated { feature_count },
            K::SpecUpdated { summary, app_spec, analysis_id } => Self::SpecUpdated { summary, app_spec, analysis_id },
            K::ReferenceAdded { reference_session_id, component_count } => {
                Self::ReferenceAdded { reference_session_id, component_count }
            }
            K::SchedulerStateChanged { from, to } => Self::SchedulerStateChanged { from, to },
            K::Error { message } => Self::Error { message },
            K::Lagged { last_delivered_seq } => Self::Lagged { last_delivered_seq },
        }
    }
}

/// Wire-facing projection of [`foreman_core::Event`] (§6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEvent {
    pub project: ProjectSlug,
    pub seq: u64,
    #[serde(flatten)]
    pub kind: WireEventKind,
    pub timestamp: DateTime<Utc>,
}

impl From<&foreman_core::Event> for WireEvent {
    fn from(event: &foreman_core::Event) -> Self {
        Self { project: event.project.clone(), seq: event.seq, kind: WireEventKind::from(&event.kind), timestamp: event.timestamp }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
