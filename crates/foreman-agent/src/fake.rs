// SPDX-License-Identifier: MIT

//! A scripted [`AgentAdapter`] for tests (§8 scenarios use this in place of
//! a real coding-agent binary).

use crate::adapter::{AgentAdapter, SpawnRequest, SpawnedProcess};
use crate::error::AgentSessionError;
use crate::types::OutputStream;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// One scripted process: a fixed sequence of lines, an exit code, and an
/// optional delay before each line (to exercise silence timeouts) or before
/// exit (to exercise wall-clock timeouts and cancellation).
#[derive(Debug, Clone, Default)]
pub struct ScriptedRun {
    pub lines: Vec<String>,
    pub exit_code: i32,
    pub line_delay: Duration,
    /// If set, the process never exits on its own — it only responds to
    /// `interrupt`/`kill`, for exercising timeout and cancel paths.
    pub hangs: bool,
}

impl ScriptedRun {
    pub fn success(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { lines: lines.into_iter().map(Into::into).collect(), exit_code: 0, ..Default::default() }
    }

    pub fn failure(lines: impl IntoIterator<Item = impl Into<String>>, exit_code: i32) -> Self {
        Self { lines: lines.into_iter().map(Into::into).collect(), exit_code, ..Default::default() }
    }

    pub fn hanging() -> Self {
        Self { hangs: true, ..Default::default() }
    }

    pub fn with_line_delay(mut self, delay: Duration) -> Self {
        self.line_delay = delay;
        self
    }
}

/// Hands out queued [`ScriptedRun`]s in call order, one per `spawn`.
#[derive(Clone, Default)]
pub struct FakeAgentAdapter {
    scripts: Arc<Mutex<VecDeque<ScriptedRun>>>,
}

impl FakeAgentAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_script(&self, script: ScriptedRun) {
        self.scripts.lock().push_back(script);
    }
}

#[async_trait]
impl AgentAdapter for FakeAgentAdapter {
    async fn spawn(&self, _request: SpawnRequest) -> Result<Box<dyn SpawnedProcess>, AgentSessionError> {
        let script = self.scripts.lock().pop_front().ok_or_else(|| {
            AgentSessionError::SpawnFailed("no scripted run queued for FakeAgentAdapter".to_string())
        })?;
        Ok(Box::new(FakeProcess {
            remaining: script.lines.into(),
            exit_code: script.exit_code,
            line_delay: script.line_delay,
            hangs: script.hangs,
            killed: false,
        }))
    }
}

struct FakeProcess {
    remaining: VecDeque<String>,
    exit_code: i32,
    line_delay: Duration,
    hangs: bool,
    killed: bool,
}

#[async_trait]
impl SpawnedProcess for FakeProcess {
    async fn next_line(&mut self) -> Option<(OutputStream, String)> {
        if let Some(line) = self.remaining.pop_front() {
            if !self.line_delay.is_zero() {
                tokio::time::sleep(self.line_delay).await;
            }
            return Some((OutputStream::Stdout, line));
        }
        if self.hangs && !self.killed {
            std::future::pending::<()>().await;
        }
        None
    }

    async fn interrupt(&mut self) {
        self.killed = true;
    }

    async fn kill(&mut self) {
        self.killed = true;
    }

    async fn wait(&mut self) -> std::io::Result<Option<i32>> {
        if self.hangs && !self.killed {
            std::future::pending::<()>().await;
        }
        Ok(if self.killed { None } else { Some(self.exit_code) })
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
