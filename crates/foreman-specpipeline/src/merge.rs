// SPDX-License-Identifier: MIT

//! Merging a new requirements document into an existing app-spec and
//! classifying the result at the section level (§4.5 "Analyze": "Generate a
//! proposed merged app-spec... Produce a diff at the section level").

use crate::error::SpecPipelineError;
use crate::generate::drain_session;
use foreman_agent::{AgentAdapter, AgentSession};
use foreman_core::{AgentRole, ChangeType, Clock, DiffEntry, ProjectSlug};
use serde::Deserialize;
use std::path::Path;

/// Compose the prompt for a merge session: instructs the agent to fold a new
/// document into the current app-spec and report which sections changed.
pub fn compose_merge_prompt(current_app_spec: &str, new_document: &str) -> String {
    format!(
        "You are merging a new requirements document into an existing application \
         specification.\n\n\
         Current specification:\n{current_app_spec}\n\n\
         New requirements document:\n{new_document}\n\n\
         Emit a single JSON object on stdout, and nothing else, of the shape \
         {{\"merged_spec\": string, \"diff\": [{{\"section\": string, \"change_type\": \
         \"cosmetic\" | \"logic\"}}]}}. `merged_spec` is the full normalized specification \
         text after folding the new document in, preserving everything from the current \
         specification that the new document does not touch. `diff` lists every section \
         whose content changed, tagged `cosmetic` if only wording or presentation changed \
         and `logic` if behavior changed."
    )
}

#[derive(Debug, Deserialize)]
struct RawDiffEntry {
    section: String,
    change_type: ChangeType,
}

#[derive(Debug, Deserialize)]
struct RawMergeResponse {
    merged_spec: String,
    #[serde(default)]
    diff: Vec<RawDiffEntry>,
}

fn parse_merge_response(stdout: &str) -> Result<(String, Vec<DiffEntry>), SpecPipelineError> {
    let raw: RawMergeResponse = serde_json::from_str(stdout.trim())?;
    let diff = raw.diff.into_iter().map(|d| DiffEntry { section: d.section, change_type: d.change_type }).collect();
    Ok((raw.merged_spec, diff))
}

/// Run one `spec_analysis` session to produce a merged app-spec and its
/// section-level diff.
pub async fn run_merge_session<A, C>(
    agents: &AgentSession<A, C>,
    project: &ProjectSlug,
    workspace_path: &Path,
    current_app_spec: &str,
    new_document: &str,
) -> Result<(String, Vec<DiffEntry>), SpecPipelineError>
where
    A: AgentAdapter,
    C: Clock,
{
    let prompt = compose_merge_prompt(current_app_spec, new_document);
    let stdout = drain_session(agents, project, AgentRole::SpecAnalysis, workspace_path, prompt).await?;
    parse_merge_response(&stdout)
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
