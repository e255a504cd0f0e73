// SPDX-License-Identifier: MIT

//! Project entity and lifecycle state (§3).

use crate::slug::ProjectSlug;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How the project's specification was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecMethod {
    /// Free-form description, chunked and expanded by SpecPipeline.
    Natural,
    /// Operator-authored structured requirements.
    Structured,
    /// Features entered by hand, no generation pass.
    Manual,
}

/// Project lifecycle state (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectState {
    Draft,
    SpecReady,
    Building,
    Paused,
    Complete,
    Error,
}

crate::simple_display! {
    ProjectState {
        Draft => "draft",
        SpecReady => "spec_ready",
        Building => "building",
        Paused => "paused",
        Complete => "complete",
        Error => "error",
    }
}

impl ProjectState {
    /// Transitions allowed by the project's own lifecycle (§3, §4.6).
    ///
    /// This is necessary-but-not-sufficient: `ProjectController` additionally
    /// gates `start_build`/`apply_spec_update` on scheduler state (§4.6).
    pub fn can_transition_to(self, target: ProjectState) -> bool {
        use ProjectState::*;
        match (self, target) {
            (Draft, SpecReady) => true,
            (SpecReady, Building) => true,
            (SpecReady, SpecReady) => true, // re-analysis without starting a build
            (Building, Paused) => true,
            (Building, Complete) => true,
            (Building, Error) => true,
            (Paused, Building) => true,
            (Complete, Building) => true, // spec update reopens completed work
            (_, Error) => true,
            (a, b) if a == b => true,
            _ => false,
        }
    }
}

/// A registered target project (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub slug: ProjectSlug,
    pub workspace_path: PathBuf,
    pub spec_method: SpecMethod,
    pub app_spec: String,
    pub state: ProjectState,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Project {
    pub fn new(
        slug: ProjectSlug,
        workspace_path: PathBuf,
        spec_method: SpecMethod,
        epoch_ms: u64,
    ) -> Self {
        Self {
            slug,
            workspace_path,
            spec_method,
            app_spec: String::new(),
            state: ProjectState::Draft,
            created_at_ms: epoch_ms,
            updated_at_ms: epoch_ms,
        }
    }
}

crate::builder! {
    pub struct ProjectBuilder => Project {
        into {
            workspace_path: PathBuf = "/tmp/test-project",
            app_spec: String = "",
        }
        set {
            slug: ProjectSlug = ProjectSlug::test("test-project"),
            spec_method: SpecMethod = SpecMethod::Natural,
            state: ProjectState = ProjectState::Draft,
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
        }
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
