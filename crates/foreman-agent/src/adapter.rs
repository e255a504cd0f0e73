// SPDX-License-Identifier: MIT

//! The seam between [`crate::session::AgentSession`] and the actual child
//! process. [`crate::process::ProcessAgentAdapter`] is the real
//! implementation; [`crate::fake::FakeAgentAdapter`] (test-support) scripts
//! one for tests without touching the OS.

use crate::error::AgentSessionError;
use crate::types::{OutputStream, StartOptions};
use async_trait::async_trait;
use foreman_core::{AgentBinaryConfig, AgentRole, ProjectSlug};
use std::path::PathBuf;

/// Everything needed to launch one agent process.
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub project: ProjectSlug,
    pub role: AgentRole,
    pub prompt: String,
    pub workspace_path: PathBuf,
    pub binary: AgentBinaryConfig,
    pub options: StartOptions,
}

/// Spawns agent processes. The only implementations should be
/// [`crate::process::ProcessAgentAdapter`] and, under `test-support`,
/// [`crate::fake::FakeAgentAdapter`].
#[async_trait]
pub trait AgentAdapter: Send + Sync + 'static {
    async fn spawn(
        &self,
        request: SpawnRequest,
    ) -> Result<Box<dyn SpawnedProcess>, AgentSessionError>;
}

/// A live child process, abstracted down to what the session supervisor
/// needs: read a line, signal it, wait for it to die.
#[async_trait]
pub trait SpawnedProcess: Send {
    /// Wait for the next captured output line from either pipe. `None` once
    /// both pipes have closed.
    async fn next_line(&mut self) -> Option<(OutputStream, String)>;

    /// Best-effort graceful interrupt (e.g. SIGINT).
    async fn interrupt(&mut self);

    /// Force-kill the process.
    async fn kill(&mut self);

    /// Block until the process has exited, yielding its exit code if the
    /// platform reports one.
    async fn wait(&mut self) -> std::io::Result<Option<i32>>;
}
