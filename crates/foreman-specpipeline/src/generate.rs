// SPDX-License-Identifier: MIT

//! Driving a `spec_analysis` AgentSession to emit structured feature
//! candidates from one requirement chunk (§4.5 step 2).

use crate::error::SpecPipelineError;
use foreman_agent::{AgentAdapter, AgentSession, OutputStream, StartOptions, StreamItem};
use foreman_core::{AgentRole, Clock, FeatureCandidate, ProjectSlug, RequirementChunk, RunOutcome, SourceSpec};
use serde::Deserialize;
use std::path::Path;

/// Compose the prompt for a `spec_analysis` session over one chunk: instructs
/// it to emit a JSON array of `{category, name, description, steps}` objects
/// on stdout and nothing else.
pub fn compose_analysis_prompt(chunk: &RequirementChunk) -> String {
    format!(
        "You are analyzing one section of a software requirements document.\n\n\
         Section: {}\n\n\
         {}\n\n\
         Emit a JSON array on stdout, and nothing else, where each element has \
         the shape {{\"category\": string, \"name\": string, \"description\": string, \
         \"steps\": [string, ...]}}. Each element is one implementable feature \
         derived from this section. Emit an empty array if the section contains \
         no implementable requirement.",
        chunk.section, chunk.text
    )
}

#[derive(Debug, Deserialize)]
struct RawCandidate {
    category: String,
    name: String,
    description: String,
    #[serde(default)]
    steps: Vec<String>,
}

fn parse_candidates(stdout: &str, source_spec: SourceSpec) -> Result<Vec<FeatureCandidate>, SpecPipelineError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let raw: Vec<RawCandidate> = serde_json::from_str(trimmed)?;
    Ok(raw
        .into_iter()
        .map(|r| FeatureCandidate { category: r.category, name: r.name, description: r.description, steps: r.steps, source_spec })
        .collect())
}

/// Start a session under `role` and drain its stream to completion, returning
/// the concatenated stdout lines. Shared by [`run_analysis_session`] and
/// `merge::run_merge_session`, which differ only in prompt and how they parse
/// the captured stdout.
pub(crate) async fn drain_session<A, C>(
    agents: &AgentSession<A, C>,
    project: &ProjectSlug,
    role: AgentRole,
    workspace_path: &Path,
    prompt: String,
) -> Result<String, SpecPipelineError>
where
    A: AgentAdapter,
    C: Clock,
{
    let session_id =
        agents.start(project, role, prompt, workspace_path.to_path_buf(), StartOptions::default()).await?;
    let mut stream = agents.stream(session_id)?;

    let mut stdout = String::new();
    let mut outcome = RunOutcome::Error;
    while let Some(item) = stream.recv().await {
        match item {
            StreamItem::Line { stream: OutputStream::Stdout, line, .. } => {
                stdout.push_str(&line);
                stdout.push('\n');
            }
            StreamItem::Line { stream: OutputStream::Stderr, .. } => {}
            StreamItem::Terminated { outcome: terminal, .. } => outcome = terminal,
        }
    }

    if !matches!(outcome, RunOutcome::Success) {
        return Err(SpecPipelineError::AnalysisFailed);
    }
    Ok(stdout)
}

/// Run one `spec_analysis` session to completion, capturing its stdout and
/// parsing it as a JSON array of feature candidates.
pub async fn run_analysis_session<A, C>(
    agents: &AgentSession<A, C>,
    project: &ProjectSlug,
    workspace_path: &Path,
    prompt: String,
    source_spec: SourceSpec,
) -> Result<Vec<FeatureCandidate>, SpecPipelineError>
where
    A: AgentAdapter,
    C: Clock,
{
    let stdout = drain_session(agents, project, AgentRole::SpecAnalysis, workspace_path, prompt).await?;
    parse_candidates(&stdout, source_spec)
}

/// Run one `spec_analysis` session per chunk and concatenate their
/// candidates, in chunk order (§4.5 step 2: "For each chunk, invoke a
/// `spec_analysis` AgentSession").
pub async fn generate_candidates_from_chunks<A, C>(
    agents: &AgentSession<A, C>,
    project: &ProjectSlug,
    workspace_path: &Path,
    chunks: &[RequirementChunk],
    source_spec: SourceSpec,
) -> Result<Vec<FeatureCandidate>, SpecPipelineError>
where
    A: AgentAdapter,
    C: Clock,
{
    let mut all = Vec::new();
    for chunk in chunks {
        let prompt = compose_analysis_prompt(chunk);
        let mut candidates = run_analysis_session(agents, project, workspace_path, prompt, source_spec).await?;
        all.append(&mut candidates);
    }
    Ok(all)
}

#[cfg(test)]
#[path = "generate_tests.rs"]
mod tests;
