// SPDX-License-Identifier: MIT

use foreman_agent::AgentSessionError;
use foreman_core::SpecUpdateAnalysisId;
use foreman_storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecPipelineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("event bus error: {0}")]
    EventBus(#[from] foreman_eventbus::EventBusError),

    #[error("agent session error: {0}")]
    Agent(#[from] AgentSessionError),

    #[error("spec_analysis session did not produce a success outcome")]
    AnalysisFailed,

    #[error("could not parse structured output from spec_analysis session: {0}")]
    MalformedOutput(#[from] serde_json::Error),

    #[error("input document yielded no requirement chunks")]
    EmptyDocument,

    #[error("spec update analysis {0} not found or expired")]
    AnalysisNotFound(SpecUpdateAnalysisId),

    #[error("mapping references feature candidate index {0} out of range")]
    CandidateIndexOutOfRange(usize),
}
