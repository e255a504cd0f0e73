// SPDX-License-Identifier: MIT

//! `foreman spec` — the two-step spec-update flow (analyze, then apply).

use crate::commands::project::parse_slug;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};
use crate::Harness;
use clap::Subcommand;
use foreman_core::{ChangeType, FeatureId, SpecUpdateAnalysisId};
use foreman_specpipeline::{CandidateMapping, MappingAction};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum SpecCommand {
    /// Diff a new document against the project's existing features.
    Analyze {
        slug: String,
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Apply an operator-approved mapping from a prior `analyze`.
    Apply {
        slug: String,
        analysis_id: String,
        /// JSON file: an array of `{candidate_index, action, change_type, feature_id?}`.
        mapping_file: PathBuf,
    },
}

/// On-disk shape of one mapping entry; `action` is `"update_existing"`
/// (requires `feature_id`), `"create_new"`, or `"skip"`.
#[derive(Debug, Deserialize)]
struct RawMapping {
    candidate_index: usize,
    action: String,
    change_type: String,
    feature_id: Option<u64>,
}

fn parse_mapping(raw: RawMapping) -> Result<CandidateMapping, ExitError> {
    let action = match raw.action.as_str() {
        "update_existing" => {
            let id = raw
                .feature_id
                .ok_or_else(|| ExitError::new(2, "update_existing mapping entries require feature_id"))?;
            MappingAction::UpdateExisting(FeatureId::new(id))
        }
        "create_new" => MappingAction::CreateNew,
        "skip" => MappingAction::Skip,
        other => return Err(ExitError::new(2, format!("unknown mapping action {other:?}"))),
    };
    let change_type = match raw.change_type.as_str() {
        "cosmetic" => ChangeType::Cosmetic,
        "logic" => ChangeType::Logic,
        other => return Err(ExitError::new(2, format!("unknown change type {other:?}"))),
    };
    Ok(CandidateMapping { candidate_index: raw.candidate_index, action, change_type })
}

pub async fn dispatch(harness: &Harness, command: SpecCommand, format: OutputFormat) -> Result<(), ExitError> {
    match command {
        SpecCommand::Analyze { slug, text, file } => {
            let slug = parse_slug(&slug)?;
            let input = match (text, file) {
                (Some(text), None) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .map_err(|e| ExitError::new(1, format!("reading {}: {e}", path.display())))?,
                _ => return Err(ExitError::new(2, "exactly one of --text or --file is required")),
            };
            let analysis = harness.analyze_spec_update(&slug, &input).await?;
            format_or_json(format, &analysis, || {
                println!("analysis {} — {} candidate(s), fully_covered={}", analysis.id, analysis.feature_candidates.len(), analysis.is_fully_covered());
            })?;
        }
        SpecCommand::Apply { slug, analysis_id, mapping_file } => {
            let slug = parse_slug(&slug)?;
            let id = SpecUpdateAnalysisId::from_string(analysis_id);
            let raw: Vec<RawMapping> = serde_json::from_str(
                &std::fs::read_to_string(&mapping_file)
                    .map_err(|e| ExitError::new(1, format!("reading {}: {e}", mapping_file.display())))?,
            )
            .map_err(|e| ExitError::new(2, format!("parsing mapping file: {e}")))?;
            let mapping: Vec<CandidateMapping> = raw.into_iter().map(parse_mapping).collect::<Result<_, _>>()?;
            harness.apply_spec_update(&slug, id, &mapping)?;
            format_or_json(format, &slug, || println!("applied spec update for {:?}", slug))?;
        }
    }
    Ok(())
}
