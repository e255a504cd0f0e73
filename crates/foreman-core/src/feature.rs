// SPDX-License-Identifier: MIT

//! Feature entity (§3): a unit of implementable work tracked per project.

use crate::ids::{FeatureId, RunId};
use serde::{Deserialize, Serialize};

/// Where a [`Feature`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSpec {
    /// Produced by SpecPipeline from a natural-language chunk.
    Generated,
    /// Brought in from an imported codebase's component inventory.
    Imported,
    /// Entered by hand through ProjectController.
    Manual,
    /// Produced from a `ComponentReferenceSession` scan.
    Reference,
    /// Produced by the diff/map/merge spec-update workflow.
    SpecUpdate,
}

crate::simple_display! {
    SourceSpec {
        Generated => "generated",
        Imported => "imported",
        Manual => "manual",
        Reference => "reference",
        SpecUpdate => "spec_update",
    }
}

/// Feature lifecycle state (§3, §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureState {
    Pending,
    InProgress,
    Done,
}

crate::simple_display! {
    FeatureState {
        Pending => "pending",
        InProgress => "in_progress",
        Done => "done",
    }
}

impl FeatureState {
    /// Transitions allowed by a feature's own lifecycle (§4.4).
    ///
    /// Necessary-but-not-sufficient: Store additionally enforces the
    /// single-in-progress-feature-per-project invariant (§3) before letting
    /// a `Pending -> InProgress` transition through.
    pub fn can_transition_to(self, target: FeatureState) -> bool {
        use FeatureState::*;
        match (self, target) {
            (Pending, InProgress) => true,
            (InProgress, Done) => true,
            (InProgress, Pending) => true, // failed run, retry or review
            (Done, Pending) => true,       // spec update reopens a feature
            (a, b) if a == b => true,
            _ => false,
        }
    }
}

/// A unit of implementable work (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub category: String,
    pub name: String,
    pub description: String,
    pub steps: Vec<String>,
    pub state: FeatureState,
    pub passes: bool,
    pub source_spec: Option<SourceSpec>,
    pub last_run: Option<RunId>,
    pub needs_review: bool,
    pub retry_count: u32,
}

impl Feature {
    pub fn new(id: FeatureId, category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            category: category.into(),
            name: name.into(),
            description: String::new(),
            steps: Vec::new(),
            state: FeatureState::Pending,
            passes: false,
            source_spec: None,
            last_run: None,
            needs_review: false,
            retry_count: 0,
        }
    }

    /// True once the feature has run out of retry attempts (§4.4 retry policy).
    pub fn retries_exhausted(&self, max_retries: u32) -> bool {
        self.retry_count >= max_retries
    }
}

crate::builder! {
    pub struct FeatureBuilder => Feature {
        into {
            category: String = "core",
            name: String = "demo-feature",
            description: String = "",
        }
        set {
            id: FeatureId = FeatureId::new(1),
            steps: Vec<String> = Vec::new(),
            state: FeatureState = FeatureState::Pending,
            passes: bool = false,
            source_spec: Option<SourceSpec> = None,
            last_run: Option<RunId> = None,
            needs_review: bool = false,
            retry_count: u32 = 0,
        }
    }
}

#[cfg(test)]
#[path = "feature_tests.rs"]
mod tests;
