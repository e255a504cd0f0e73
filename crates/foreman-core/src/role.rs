// SPDX-License-Identifier: MIT

//! Agent session roles (§4.3): coding, spec_analysis, redesign, analysis.

use serde::{Deserialize, Serialize};

/// The purpose of an [`crate::session`]-supervised agent process.
///
/// At most one session per (project, role) may be live at a time (§3 Invariants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Implement a feature.
    Coding,
    /// Analyze a requirements document.
    SpecAnalysis,
    /// Rewrite the UI.
    Redesign,
    /// Inspect an imported codebase.
    Analysis,
}

crate::simple_display! {
    AgentRole {
        Coding => "coding",
        SpecAnalysis => "spec_analysis",
        Redesign => "redesign",
        Analysis => "analysis",
    }
}

impl AgentRole {
    pub fn all() -> [AgentRole; 4] {
        [AgentRole::Coding, AgentRole::SpecAnalysis, AgentRole::Redesign, AgentRole::Analysis]
    }
}
