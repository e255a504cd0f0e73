// SPDX-License-Identifier: MIT

//! Identifier types for the remaining entities in the data model (§3).
//!
//! `FeatureId` is a per-project monotonic integer, per spec — not a random
//! nanoid — so it gets a hand-written newtype instead of [`crate::define_id!`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable integer id for a [`crate::feature::Feature`], monotonic per project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(pub u64);

impl FeatureId {
    pub const fn new(n: u64) -> Self {
        Self(n)
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

crate::define_id! {
    /// Identifies one attempt (§3 `Run`) to implement a feature.
    pub struct RunId("run-");
}

crate::define_id! {
    /// Identifies one supervised [`crate::session::AgentRole`] child process.
    pub struct SessionId("ses-");
}

crate::define_id! {
    /// Identifies one transient [`crate::spec_update::SpecUpdateAnalysis`].
    pub struct SpecUpdateAnalysisId("sua-");
}

crate::define_id! {
    /// Identifies one [`crate::reference::ComponentReferenceSession`].
    pub struct ReferenceSessionId("ref-");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_id_increments() {
        let a = FeatureId::new(1);
        assert_eq!(a.next(), FeatureId::new(2));
    }

    #[test]
    fn feature_id_ordering_is_numeric() {
        assert!(FeatureId::new(2) < FeatureId::new(10));
    }

    #[test]
    fn run_id_has_prefix() {
        assert!(RunId::new().as_str().starts_with("run-"));
    }
}
