// SPDX-License-Identifier: MIT

//! Spec-analysis and reference-session storage helpers.
//!
//! Unlike features/runs/projects, these are transient (§3, ttl-bound) and
//! are not reconstructed from WAL replay — a crash mid-analysis simply
//! loses the in-flight analysis, which the operator re-runs.

use foreman_core::{ComponentReferenceSession, ReferenceSessionId, SpecUpdateAnalysis, SpecUpdateAnalysisId};

use super::MaterializedState;

impl MaterializedState {
    pub fn save_spec_analysis(&mut self, analysis: SpecUpdateAnalysis) {
        self.spec_analyses.insert(analysis.id, analysis);
    }

    pub fn load_spec_analysis(&self, id: &SpecUpdateAnalysisId) -> Option<&SpecUpdateAnalysis> {
        self.spec_analyses.get(id)
    }

    /// Drop every analysis older than `created_before_ms`, returning how many were dropped.
    pub fn expire_spec_analyses(&mut self, created_before_ms: u64) -> usize {
        let before = self.spec_analyses.len();
        self.spec_analyses.retain(|_, a| a.created_at_ms >= created_before_ms);
        before - self.spec_analyses.len()
    }

    pub fn save_reference_session(&mut self, session: ComponentReferenceSession) {
        self.reference_sessions.insert(session.id, session);
    }

    pub fn get_reference_session(&self, id: &ReferenceSessionId) -> Option<&ComponentReferenceSession> {
        self.reference_sessions.get(id)
    }
}
