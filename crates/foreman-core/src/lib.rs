// SPDX-License-Identifier: MIT

//! Shared data model for the feature-scheduling and agent-session engine:
//! entities (§3), the `Clock` abstraction, the `Config` surface (§6), and
//! the validation error taxonomy (§7) that the other crates build on.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod macros;

pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod feature;
pub mod id;
pub mod ids;
pub mod project;
pub mod reference;
pub mod role;
pub mod run;
pub mod similarity;
pub mod slug;
pub mod spec_update;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{AgentBinaryConfig, Config};
pub use error::ValidationError;
pub use event::{Event, EventKind};
pub use feature::{Feature, FeatureState, SourceSpec};
pub use ids::{FeatureId, ReferenceSessionId, RunId, SessionId, SpecUpdateAnalysisId};
pub use project::{Project, ProjectState, SpecMethod};
pub use reference::{ComponentDescriptor, ComponentReferenceSession};
pub use role::AgentRole;
pub use run::{OutputRef, Run, RunOutcome};
pub use slug::ProjectSlug;
pub use spec_update::{
    ChangeType, CoverageEntry, DiffEntry, FeatureCandidate, FeatureKey, MatchCandidate,
    RequirementChunk, SpecUpdateAnalysis,
};
