// SPDX-License-Identifier: MIT

//! Project slug validation (§3: "lowercase alphanumerics, hyphens, underscores; 1-64 chars").

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated project identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectSlug(String);

impl ProjectSlug {
    pub fn parse(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        if s.is_empty() || s.len() > 64 {
            return Err(ValidationError::InvalidSlug(s));
        }
        if !s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_') {
            return Err(ValidationError::InvalidSlug(s));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProjectSlug {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<ProjectSlug> for String {
    fn from(slug: ProjectSlug) -> Self {
        slug.0
    }
}

impl fmt::Display for ProjectSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::borrow::Borrow<str> for ProjectSlug {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ProjectSlug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(any(test, feature = "test-support"))]
impl ProjectSlug {
    /// Build a slug for tests without going through validation error handling.
    pub fn test(s: &str) -> Self {
        Self::parse(s).expect("valid test slug")
    }
}

#[cfg(test)]
#[path = "slug_tests.rs"]
mod tests;
