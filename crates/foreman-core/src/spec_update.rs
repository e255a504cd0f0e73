// SPDX-License-Identifier: MIT

//! Spec ingestion and spec-update intermediates (§3, §4.5).

use crate::feature::SourceSpec;
use crate::ids::{FeatureId, SpecUpdateAnalysisId};
use crate::slug::ProjectSlug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One chunk of a natural-language requirements document (§4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementChunk {
    pub section: String,
    pub text: String,
}

/// Coverage of one section of the proposed spec by generated features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageEntry {
    pub section: String,
    pub requirement_count: usize,
    pub coverage_complete: bool,
}

/// Whether a diffed section changed wording only, or changed behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Cosmetic,
    Logic,
}

crate::simple_display! {
    ChangeType {
        Cosmetic => "cosmetic",
        Logic => "logic",
    }
}

/// One changed section between the current and proposed app spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub section: String,
    pub change_type: ChangeType,
}

/// A feature proposed by SpecPipeline generation, prior to dedup (§4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCandidate {
    pub category: String,
    pub name: String,
    pub description: String,
    pub steps: Vec<String>,
    pub source_spec: SourceSpec,
}

/// Dedup key for grouping candidates against existing features (§4.5, §8
/// property 6: Jaccard similarity over `(category, name)` tokens).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureKey {
    pub category: String,
    pub name: String,
}

impl FeatureKey {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self { category: category.into(), name: name.into() }
    }
}

/// An existing feature judged similar enough to a new candidate to merge
/// rather than create (§4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub feature_id: FeatureId,
    pub similarity: f64,
}

/// A transient analysis produced by re-ingesting an updated spec (§3, §4.5).
///
/// Not itself persisted as Store's source of truth for features — it is the
/// staging area the diff/map/merge workflow operates on before `apply` folds
/// accepted changes into real `Feature` records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecUpdateAnalysis {
    pub id: SpecUpdateAnalysisId,
    pub project: ProjectSlug,
    pub created_at_ms: u64,
    pub input_text: String,
    pub requirement_chunks: Vec<RequirementChunk>,
    pub coverage: Vec<CoverageEntry>,
    pub proposed_app_spec: String,
    pub diff: Vec<DiffEntry>,
    pub feature_candidates: Vec<FeatureCandidate>,
    pub match_candidates: HashMap<FeatureKey, Vec<MatchCandidate>>,
}

impl SpecUpdateAnalysis {
    pub fn new(
        id: SpecUpdateAnalysisId,
        project: ProjectSlug,
        created_at_ms: u64,
        input_text: impl Into<String>,
    ) -> Self {
        Self {
            id,
            project,
            created_at_ms,
            input_text: input_text.into(),
            requirement_chunks: Vec::new(),
            coverage: Vec::new(),
            proposed_app_spec: String::new(),
            diff: Vec::new(),
            feature_candidates: Vec::new(),
            match_candidates: HashMap::new(),
        }
    }

    /// True once every requirement chunk's section is fully covered (§4.5).
    pub fn is_fully_covered(&self) -> bool {
        !self.coverage.is_empty() && self.coverage.iter().all(|c| c.coverage_complete)
    }

    /// Sections whose diff entries are behavior-affecting, not cosmetic.
    pub fn logic_changed_sections(&self) -> Vec<&str> {
        self.diff
            .iter()
            .filter(|d| d.change_type == ChangeType::Logic)
            .map(|d| d.section.as_str())
            .collect()
    }
}

#[cfg(test)]
#[path = "spec_update_tests.rs"]
mod tests;
