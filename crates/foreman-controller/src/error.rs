// SPDX-License-Identifier: MIT

//! Aggregate error taxonomy for the single entry point (§4.6, §7).

use foreman_agent::AgentSessionError;
use foreman_core::{AgentRole, ProjectSlug, ValidationError};
use foreman_eventbus::EventBusError;
use foreman_scheduler::{SchedulerError, SchedulerState};
use foreman_specpipeline::SpecPipelineError;
use foreman_storage::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by [`crate::controller::ProjectController`] (§7's
/// `ValidationError` / `NotFound` / `InvalidTransition` / `Concurrency`
/// kinds, plus the underlying component errors it wraps transparently).
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("project {0:?} not found")]
    ProjectNotFound(ProjectSlug),

    #[error("project {0:?} is already registered")]
    AlreadyRegistered(ProjectSlug),

    #[error("workspace path {0:?} is already owned by another registered project")]
    WorkspaceInUse(PathBuf),

    #[error("start_build requires project {0:?} to be spec_ready with at least one pending feature")]
    NotReadyToBuild(ProjectSlug),

    #[error("apply_spec_update rejected: scheduler for project {0:?} is in-flight ({1})")]
    UpdateWhileInFlight(ProjectSlug, SchedulerState),

    #[error("a {0} session is already active for project {1:?}")]
    ConcurrentSessionConflict(AgentRole, ProjectSlug),

    #[error("generate_features called for project {0:?} before set_spec_inputs")]
    SpecInputsNotSet(ProjectSlug),

    #[error("malformed reference-session output: {0}")]
    MalformedReferenceOutput(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    EventBus(#[from] EventBusError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    AgentSession(#[from] AgentSessionError),

    #[error(transparent)]
    SpecPipeline(#[from] SpecPipelineError),
}
