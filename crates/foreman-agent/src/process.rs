// SPDX-License-Identifier: MIT

//! Spawns the configured external agent binary as a local child process,
//! streaming its stdout/stderr line by line (§4.3).

use crate::adapter::{AgentAdapter, SpawnRequest, SpawnedProcess};
use crate::error::AgentSessionError;
use crate::types::OutputStream;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

/// Real [`AgentAdapter`]: runs the role's configured binary against the
/// project workspace, with `prompt` written to its stdin.
#[derive(Debug, Clone, Default)]
pub struct ProcessAgentAdapter;

impl ProcessAgentAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AgentAdapter for ProcessAgentAdapter {
    async fn spawn(
        &self,
        request: SpawnRequest,
    ) -> Result<Box<dyn SpawnedProcess>, AgentSessionError> {
        tokio::fs::create_dir_all(&request.workspace_path).await?;

        let mut args = request.binary.args_template.clone();
        if let Some(model) = &request.options.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }
        args.extend(request.options.extra_args.clone());

        let mut command = Command::new(&request.binary.binary);
        command
            .args(&args)
            .current_dir(&request.workspace_path)
            .envs(&request.binary.env_template)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            tracing::warn!(binary = %request.binary.binary, error = %e, "failed to spawn agent process");
            AgentSessionError::SpawnFailed(format!("{}: {e}", request.binary.binary))
        })?;

        tracing::info!(
            project = %request.project,
            role = %request.role,
            binary = %request.binary.binary,
            pid = ?child.id(),
            "agent process spawned"
        );

        if let Some(mut stdin) = child.stdin.take() {
            let prompt = request.prompt.clone();
            tokio::spawn(async move {
                let _ = stdin.write_all(prompt.as_bytes()).await;
                let _ = stdin.write_all(b"\n").await;
                let _ = stdin.shutdown().await;
            });
        }

        #[allow(clippy::expect_used)]
        let stdout = child.stdout.take().expect("stdout was piped");
        #[allow(clippy::expect_used)]
        let stderr = child.stderr.take().expect("stderr was piped");

        let (tx, rx) = mpsc::channel(64);
        spawn_line_reader(tx.clone(), BufReader::new(stdout), OutputStream::Stdout);
        spawn_line_reader(tx, BufReader::new(stderr), OutputStream::Stderr);

        Ok(Box::new(ChildProcess { child, lines: rx }))
    }
}

fn spawn_line_reader<R>(tx: mpsc::Sender<(OutputStream, String)>, reader: BufReader<R>, which: OutputStream)
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send((which, line)).await.is_err() {
                        break;
                    }
                }
                Ok(None) | Err(_) => break,
            }
        }
    });
}

struct ChildProcess {
    child: Child,
    lines: mpsc::Receiver<(OutputStream, String)>,
}

#[async_trait]
impl SpawnedProcess for ChildProcess {
    async fn next_line(&mut self) -> Option<(OutputStream, String)> {
        self.lines.recv().await
    }

    async fn interrupt(&mut self) {
        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            let _ = Command::new("kill").args(["-INT", &pid.to_string()]).status().await;
            return;
        }
        let _ = self.child.start_kill();
    }

    async fn kill(&mut self) {
        let _ = self.child.start_kill();
    }

    async fn wait(&mut self) -> std::io::Result<Option<i32>> {
        let status = self.child.wait().await?;
        Ok(status.code())
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
