// SPDX-License-Identifier: MIT

//! The pluggable verification hook (§6): the scheduler never verifies
//! features itself.

use async_trait::async_trait;
use foreman_core::Feature;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

/// Result of running the verification hook over a feature (§6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub passes: bool,
    pub details: String,
}

impl VerificationOutcome {
    pub fn passed(details: impl Into<String>) -> Self {
        Self { passes: true, details: details.into() }
    }

    pub fn failed(details: impl Into<String>) -> Self {
        Self { passes: false, details: details.into() }
    }
}

/// External collaborator (§6 "Verification hook") invoked after every
/// coding session that terminates with `success` or `failed`.
#[async_trait]
pub trait VerificationHook: Send + Sync {
    async fn verify(&self, workspace_path: &Path, feature: &Feature) -> VerificationOutcome;
}

/// Real [`VerificationHook`]: runs a fixed command in the project workspace
/// and treats a zero exit code as a pass, timing out at a bounded duration
/// (§6 "within a bounded duration, default 2 min").
pub struct CommandVerificationHook {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandVerificationHook {
    pub fn new(command: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self { command: command.into(), args, timeout }
    }

    pub fn with_default_timeout(command: impl Into<String>, args: Vec<String>) -> Self {
        Self::new(command, args, Duration::from_secs(120))
    }
}

#[async_trait]
impl VerificationHook for CommandVerificationHook {
    async fn verify(&self, workspace_path: &Path, feature: &Feature) -> VerificationOutcome {
        let run = Command::new(&self.command).args(&self.args).current_dir(workspace_path).output();

        match tokio::time::timeout(self.timeout, run).await {
            Ok(Ok(output)) => {
                let passes = output.status.success();
                let mut details = String::from_utf8_lossy(&output.stdout).into_owned();
                details.push_str(&String::from_utf8_lossy(&output.stderr));
                if details.trim().is_empty() {
                    details = format!("{} exited with {}", self.command, output.status);
                }
                VerificationOutcome { passes, details }
            }
            Ok(Err(err)) => {
                tracing::warn!(command = %self.command, feature = %feature.id, error = %err, "verification command failed to spawn");
                VerificationOutcome::failed(format!("failed to run {}: {err}", self.command))
            }
            Err(_) => VerificationOutcome::failed(format!("verification command timed out after {:?}", self.timeout)),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Hands out queued [`VerificationOutcome`]s in call order; defaults to
    /// always-passing once the queue is drained.
    #[derive(Default)]
    pub struct FakeVerificationHook {
        queue: Mutex<VecDeque<VerificationOutcome>>,
    }

    impl FakeVerificationHook {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&self, outcome: VerificationOutcome) {
            self.queue.lock().push_back(outcome);
        }

        pub fn always_pass() -> Self {
            Self::new()
        }

        pub fn always_fail(details: impl Into<String>) -> Self {
            let hook = Self::new();
            let details = details.into();
            // Queue a handful; scheduler tests never run more than a few
            // retries before the cap kicks in.
            for _ in 0..16 {
                hook.push(VerificationOutcome::failed(details.clone()));
            }
            hook
        }
    }

    #[async_trait]
    impl VerificationHook for FakeVerificationHook {
        async fn verify(&self, _workspace_path: &Path, _feature: &Feature) -> VerificationOutcome {
            self.queue.lock().pop_front().unwrap_or_else(|| VerificationOutcome::passed("no scripted outcome queued"))
        }
    }
}
