// SPDX-License-Identifier: MIT

//! Run entity (§3): one attempt to implement a [`crate::feature::Feature`].

use crate::ids::{FeatureId, RunId, SessionId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Success,
    Failed,
    Cancelled,
    Timeout,
    Error,
}

crate::simple_display! {
    RunOutcome {
        Success => "success",
        Failed => "failed",
        Cancelled => "cancelled",
        Timeout => "timeout",
        Error => "error",
    }
}

/// A durable pointer into a run's append-only output-buffer file (§6:
/// "one file per run, append-only, capped at a configurable size with
/// rotation").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRef {
    pub path: PathBuf,
    pub byte_offset: u64,
    pub byte_len: u64,
}

impl OutputRef {
    pub fn empty(path: PathBuf) -> Self {
        Self { path, byte_offset: 0, byte_len: 0 }
    }

    /// Extend the ref to cover `additional_bytes` more appended bytes.
    pub fn extend(&mut self, additional_bytes: u64) {
        self.byte_len += additional_bytes;
    }
}

/// One attempt (§3) to implement a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub feature_id: FeatureId,
    pub started_at_ms: u64,
    pub ended_at_ms: Option<u64>,
    pub outcome: Option<RunOutcome>,
    pub exit_code: Option<i32>,
    pub session_id: Option<SessionId>,
    pub output_ref: OutputRef,
}

impl Run {
    pub fn start(
        id: RunId,
        feature_id: FeatureId,
        started_at_ms: u64,
        output_path: PathBuf,
    ) -> Self {
        Self {
            id,
            feature_id,
            started_at_ms,
            ended_at_ms: None,
            outcome: None,
            exit_code: None,
            session_id: None,
            output_ref: OutputRef::empty(output_path),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn finish(&mut self, ended_at_ms: u64, outcome: RunOutcome, exit_code: Option<i32>) {
        self.ended_at_ms = Some(ended_at_ms);
        self.outcome = Some(outcome);
        self.exit_code = exit_code;
    }
}

crate::builder! {
    pub struct RunBuilder => Run {
        set {
            id: RunId = RunId::new(),
            feature_id: FeatureId = FeatureId::new(1),
            started_at_ms: u64 = 1_000_000,
            ended_at_ms: Option<u64> = None,
            outcome: Option<RunOutcome> = None,
            exit_code: Option<i32> = None,
            session_id: Option<SessionId> = None,
            output_ref: OutputRef = OutputRef::empty(PathBuf::from("/tmp/run.out")),
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
