// SPDX-License-Identifier: MIT

//! Component reference sessions (§3): scanning an imported codebase for
//! components to seed `Feature`s with `SourceSpec::Reference`.

use crate::ids::ReferenceSessionId;
use crate::slug::ProjectSlug;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One discovered component in an imported reference codebase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    pub name: String,
    pub path: PathBuf,
    pub metadata: serde_json::Value,
}

/// A scan of an imported codebase's components (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentReferenceSession {
    pub id: ReferenceSessionId,
    pub project: ProjectSlug,
    pub components: Vec<ComponentDescriptor>,
    pub created_at_ms: u64,
}

impl ComponentReferenceSession {
    pub fn new(id: ReferenceSessionId, project: ProjectSlug, created_at_ms: u64) -> Self {
        Self { id, project, components: Vec::new(), created_at_ms }
    }
}

#[cfg(test)]
#[path = "reference_tests.rs"]
mod tests;
