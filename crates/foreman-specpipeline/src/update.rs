// SPDX-License-Identifier: MIT

//! Top-level orchestration for initial spec generation and the spec-update
//! analyze/apply workflow (§4.5).

use crate::dedup::{dedup_candidates, fit_to_target, rank_matches};
use crate::error::SpecPipelineError;
use crate::generate::{compose_analysis_prompt, generate_candidates_from_chunks, run_analysis_session};
use crate::merge::run_merge_session;
use crate::chunk::chunk_document;
use foreman_agent::{AgentAdapter, AgentSession};
use foreman_core::{
    ChangeType, Clock, CoverageEntry, Feature, FeatureCandidate, FeatureId, FeatureKey, ProjectSlug, SourceSpec,
    SpecUpdateAnalysis, SpecUpdateAnalysisId,
};
use foreman_eventbus::EventBus;
use foreman_storage::{FeatureContentUpdate, NewFeature, SpecUpdateApply, Store};
use std::collections::HashMap;
use std::path::Path;

/// Default top-K rank depth for match candidates (§4.5 "rank top-K (default 5)").
pub const DEFAULT_MATCH_TOP_K: usize = 5;

/// Default sanity cap on generated feature count when no target range was
/// supplied (§4.5 "warn if it exceeds a sanity cap (default 200)").
pub const DEFAULT_SANITY_CAP: usize = 200;

/// Run initial spec generation to completion: chunk the input, generate
/// candidates per chunk, deduplicate, and fit to the caller's target range
/// (§4.5 "Initial generation"). Does not persist anything; the caller decides
/// how to turn the result into pending features.
pub async fn generate_initial_spec<A, C>(
    agents: &AgentSession<A, C>,
    project: &ProjectSlug,
    workspace_path: &Path,
    input_text: &str,
    dedup_threshold: f64,
    feature_count_target: Option<(usize, usize)>,
) -> Result<Vec<FeatureCandidate>, SpecPipelineError>
where
    A: AgentAdapter,
    C: Clock,
{
    let chunks = chunk_document(input_text);
    if chunks.is_empty() {
        return Err(SpecPipelineError::EmptyDocument);
    }

    let candidates =
        generate_candidates_from_chunks(agents, project, workspace_path, &chunks, SourceSpec::Generated).await?;
    let deduped = dedup_candidates(candidates, dedup_threshold);
    let fitted = fit_to_target(deduped, feature_count_target);

    if feature_count_target.is_none() && fitted.len() > DEFAULT_SANITY_CAP {
        tracing::warn!(count = fitted.len(), cap = DEFAULT_SANITY_CAP, "generated feature count exceeds sanity cap");
    }

    Ok(fitted)
}

/// Run the "Analyze" half of spec update (§4.5 step 1): chunk the new
/// document, compute coverage, merge it into the current app-spec with a
/// section-level diff, generate and dedup feature candidates from the merged
/// spec, rank match candidates against `existing_features`, and persist the
/// result as a [`SpecUpdateAnalysis`].
#[allow(clippy::too_many_arguments)]
pub async fn analyze<A, C>(
    agents: &AgentSession<A, C>,
    store: &Store<C>,
    project: &ProjectSlug,
    workspace_path: &Path,
    existing_features: &[Feature],
    input_text: &str,
    now_ms: u64,
    dedup_threshold: f64,
    match_top_k: usize,
) -> Result<SpecUpdateAnalysis, SpecPipelineError>
where
    A: AgentAdapter,
    C: Clock,
{
    let chunks = chunk_document(input_text);
    if chunks.is_empty() {
        return Err(SpecPipelineError::EmptyDocument);
    }

    let mut coverage = Vec::with_capacity(chunks.len());
    let mut candidates = Vec::new();
    for chunk in &chunks {
        let prompt = compose_analysis_prompt(chunk);
        let chunk_candidates =
            run_analysis_session(agents, project, workspace_path, prompt, SourceSpec::SpecUpdate).await?;
        coverage.push(CoverageEntry {
            section: chunk.section.clone(),
            requirement_count: chunk_candidates.len(),
            coverage_complete: !chunk_candidates.is_empty(),
        });
        candidates.extend(chunk_candidates);
    }

    let current = store.get_project(project)?;
    let (proposed_app_spec, diff) =
        run_merge_session(agents, project, workspace_path, &current.app_spec, input_text).await?;

    let deduped = dedup_candidates(candidates, dedup_threshold);

    let mut match_candidates = HashMap::new();
    for candidate in &deduped {
        let key = FeatureKey::new(candidate.category.clone(), candidate.name.clone());
        let matches = rank_matches(candidate, existing_features, match_top_k);
        match_candidates.insert(key, matches);
    }

    let mut analysis = SpecUpdateAnalysis::new(SpecUpdateAnalysisId::new(), project.clone(), now_ms, input_text);
    analysis.requirement_chunks = chunks;
    analysis.coverage = coverage;
    analysis.proposed_app_spec = proposed_app_spec;
    analysis.diff = diff;
    analysis.feature_candidates = deduped;
    analysis.match_candidates = match_candidates;

    store.save_spec_analysis(project, analysis.clone())?;
    Ok(analysis)
}

/// What the operator decided for one feature candidate during "Map" (§4.5
/// step 2).
#[derive(Debug, Clone, Copy)]
pub enum MappingAction {
    UpdateExisting(FeatureId),
    CreateNew,
    Skip,
}

/// One entry of the operator-approved mapping passed to [`apply`].
#[derive(Debug, Clone, Copy)]
pub struct CandidateMapping {
    pub candidate_index: usize,
    pub action: MappingAction,
    pub change_type: ChangeType,
}

/// Run the "Apply" half of spec update (§4.5 step 3): given an analysis id
/// and the operator's mapping, replace the app-spec and create/update
/// features in a single Store transaction via [`EventBus::apply_spec_update`].
///
/// An apply may be retried against the same analysis id until it expires
/// (§4.5 "Failure semantics"); this function does not itself expire or
/// delete the analysis.
pub fn apply<C: Clock>(
    store: &Store<C>,
    bus: &EventBus<C>,
    analysis_id: SpecUpdateAnalysisId,
    mapping: &[CandidateMapping],
) -> Result<(), SpecPipelineError> {
    let analysis = store.load_spec_analysis(&analysis_id).map_err(|_| SpecPipelineError::AnalysisNotFound(analysis_id))?;

    let mut creates = Vec::new();
    let mut updates = Vec::new();
    for entry in mapping {
        let candidate = analysis
            .feature_candidates
            .get(entry.candidate_index)
            .ok_or(SpecPipelineError::CandidateIndexOutOfRange(entry.candidate_index))?;
        match entry.action {
            MappingAction::CreateNew => creates.push(NewFeature {
                category: candidate.category.clone(),
                name: candidate.name.clone(),
                description: candidate.description.clone(),
                steps: candidate.steps.clone(),
                source_spec: Some(SourceSpec::SpecUpdate),
            }),
            MappingAction::UpdateExisting(feature_id) => updates.push(FeatureContentUpdate {
                feature_id,
                category: candidate.category.clone(),
                name: candidate.name.clone(),
                description: candidate.description.clone(),
                steps: candidate.steps.clone(),
                change_type: entry.change_type,
            }),
            MappingAction::Skip => {}
        }
    }

    let summary = format!("spec update applied: {} created, {} updated", creates.len(), updates.len());
    bus.apply_spec_update(
        &analysis.project,
        SpecUpdateApply { analysis_id, app_spec: analysis.proposed_app_spec.clone(), summary, creates, updates },
    )?;
    Ok(())
}

#[cfg(test)]
#[path = "update_tests.rs"]
mod tests;
