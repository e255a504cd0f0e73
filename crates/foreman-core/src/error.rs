// SPDX-License-Identifier: MIT

//! Shared validation error kinds (§7), used at the boundary of several crates.

use thiserror::Error;

/// Malformed input: bad slug, missing field, out-of-range value.
///
/// Surfaced directly to the caller; never retried (§7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid project slug {0:?}: must be 1-64 lowercase alphanumeric/hyphen/underscore characters")]
    InvalidSlug(String),

    #[error("workspace path is not writable: {0}")]
    PathNotWritable(String),

    #[error("feature name must be 1-200 characters, got {0}")]
    InvalidFeatureName(usize),

    #[error("{field} is required")]
    MissingField { field: &'static str },
}
