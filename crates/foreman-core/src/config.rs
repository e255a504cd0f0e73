// SPDX-License-Identifier: MIT

//! Configuration surface (§6): one `Config` per installation, loaded from
//! `foreman.toml` and defaulted per spec where the file omits a field.

use crate::role::AgentRole;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// How to launch the external agent binary for a given [`AgentRole`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentBinaryConfig {
    pub binary: String,
    #[serde(default)]
    pub args_template: Vec<String>,
    #[serde(default)]
    pub env_template: HashMap<String, String>,
}

/// Installation-wide configuration (§6 "Configuration surface").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub database_path: PathBuf,
    pub projects_root: PathBuf,

    #[serde(default = "defaults::default_coding_timeout_s")]
    pub default_coding_timeout_s: u64,
    #[serde(default = "defaults::default_analysis_timeout_s")]
    pub default_analysis_timeout_s: u64,
    #[serde(default = "defaults::silence_timeout_s")]
    pub silence_timeout_s: u64,
    #[serde(default = "defaults::session_grace_period_s")]
    pub session_grace_period_s: u64,
    #[serde(default = "defaults::event_buffer_size")]
    pub event_buffer_size: usize,
    #[serde(default = "defaults::event_retention_per_project")]
    pub event_retention_per_project: usize,
    #[serde(default = "defaults::retry_cap")]
    pub retry_cap: u32,
    #[serde(default = "defaults::dedup_similarity_threshold")]
    pub dedup_similarity_threshold: f64,
    #[serde(default = "defaults::spec_analysis_ttl_s")]
    pub spec_analysis_ttl_s: u64,
    #[serde(default)]
    pub agent_binaries: HashMap<AgentRole, AgentBinaryConfig>,
}

mod defaults {
    pub fn default_coding_timeout_s() -> u64 {
        1800
    }
    pub fn default_analysis_timeout_s() -> u64 {
        300
    }
    pub fn silence_timeout_s() -> u64 {
        300
    }
    pub fn session_grace_period_s() -> u64 {
        10
    }
    pub fn event_buffer_size() -> usize {
        256
    }
    pub fn event_retention_per_project() -> usize {
        10_000
    }
    pub fn retry_cap() -> u32 {
        3
    }
    pub fn dedup_similarity_threshold() -> f64 {
        0.85
    }
    pub fn spec_analysis_ttl_s() -> u64 {
        3600
    }
}

impl Config {
    /// Minimal config with every optional field at its spec default.
    pub fn new(database_path: PathBuf, projects_root: PathBuf) -> Self {
        Self {
            database_path,
            projects_root,
            default_coding_timeout_s: defaults::default_coding_timeout_s(),
            default_analysis_timeout_s: defaults::default_analysis_timeout_s(),
            silence_timeout_s: defaults::silence_timeout_s(),
            session_grace_period_s: defaults::session_grace_period_s(),
            event_buffer_size: defaults::event_buffer_size(),
            event_retention_per_project: defaults::event_retention_per_project(),
            retry_cap: defaults::retry_cap(),
            dedup_similarity_threshold: defaults::dedup_similarity_threshold(),
            spec_analysis_ttl_s: defaults::spec_analysis_ttl_s(),
            agent_binaries: HashMap::new(),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
