// SPDX-License-Identifier: MIT

use foreman_agent::AgentSessionError;
use foreman_core::{FeatureId, ProjectSlug};
use foreman_storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("no scheduler is registered for project {0:?}")]
    NotFound(ProjectSlug),

    #[error("feature {0} not found")]
    FeatureNotFound(FeatureId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    AgentSession(#[from] AgentSessionError),

    #[error("scheduler driver task for {0:?} is no longer running")]
    ChannelClosed(ProjectSlug),
}
