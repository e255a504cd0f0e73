// SPDX-License-Identifier: MIT

use foreman_core::{AgentRole, ProjectSlug};
use thiserror::Error;

/// Errors from the agent-session supervisor (§4.3).
#[derive(Debug, Error)]
pub enum AgentSessionError {
    #[error("session not found: {0}")]
    NotFound(foreman_core::SessionId),

    #[error("a {role} session is already live for project {project}")]
    Busy { project: ProjectSlug, role: AgentRole },

    #[error("no agent binary configured for role {0}")]
    UnconfiguredRole(AgentRole),

    #[error("failed to spawn agent process: {0}")]
    SpawnFailed(String),

    #[error("stream already taken for session {0}")]
    StreamAlreadyTaken(foreman_core::SessionId),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
