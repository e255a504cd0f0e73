// SPDX-License-Identifier: MIT

//! Turning a free-form project description into an app-spec and an ordered
//! feature list, and merging a later requirements document into an existing
//! project without losing completed work (§4.5).

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod chunk;
mod dedup;
mod error;
mod generate;
mod merge;
mod update;

pub use chunk::chunk_document;
pub use dedup::{dedup_candidates, fit_to_target, rank_matches};
pub use error::SpecPipelineError;
pub use generate::{compose_analysis_prompt, generate_candidates_from_chunks, run_analysis_session};
pub use merge::{compose_merge_prompt, run_merge_session};
pub use update::{
    analyze, apply, generate_initial_spec, CandidateMapping, MappingAction, DEFAULT_MATCH_TOP_K, DEFAULT_SANITY_CAP,
};
