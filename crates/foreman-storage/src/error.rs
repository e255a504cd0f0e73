// SPDX-License-Identifier: MIT

//! Store error taxonomy (§7).

use foreman_core::{FeatureId, ProjectSlug, ReferenceSessionId, RunId, SpecUpdateAnalysisId, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("project {0:?} already exists")]
    ProjectAlreadyExists(ProjectSlug),

    #[error("project {0:?} not found")]
    ProjectNotFound(ProjectSlug),

    #[error("feature {0} not found in project {1:?}")]
    FeatureNotFound(FeatureId, ProjectSlug),

    #[error("a feature with name {0:?} already exists in project {1:?}")]
    DuplicateFeatureName(String, ProjectSlug),

    #[error("run {0} not found")]
    RunNotFound(RunId),

    #[error("run {0} is already finished")]
    RunAlreadyFinished(RunId),

    #[error("invalid transition for project {0:?}: {1} -> {2}")]
    InvalidProjectTransition(ProjectSlug, String, String),

    #[error("invalid transition for feature {0}: {1} -> {2}")]
    InvalidFeatureTransition(FeatureId, String, String),

    #[error("concurrency violation in project {0:?}: {1}")]
    Concurrency(ProjectSlug, String),

    #[error("spec analysis {0} not found")]
    SpecAnalysisNotFound(SpecUpdateAnalysisId),

    #[error("spec analysis {0} has expired")]
    SpecAnalysisExpired(SpecUpdateAnalysisId),

    #[error("reference session {0} not found")]
    ReferenceSessionNotFound(ReferenceSessionId),

    #[error("wal error: {0}")]
    Wal(#[from] crate::wal::WalError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] crate::snapshot::SnapshotError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
