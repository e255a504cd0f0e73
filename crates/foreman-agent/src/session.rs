// SPDX-License-Identifier: MIT

//! The agent-session supervisor (§4.3): launches one external agent process
//! per `start` call, streams its output, and enforces the wall-clock and
//! silence timeouts while at most one session per `(project, role)` is live.

use crate::adapter::{AgentAdapter, SpawnRequest, SpawnedProcess};
use crate::error::AgentSessionError;
use crate::timeout::SessionTimeouts;
use crate::types::{SessionState, SessionStatus, StartOptions, StreamItem};
use chrono::{DateTime, Utc};
use foreman_core::{AgentRole, Clock, Config, ProjectSlug, RunOutcome, SessionId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

struct SessionRecord {
    state: Arc<Mutex<SessionState>>,
    started_at: DateTime<Utc>,
    last_line_at: Arc<Mutex<Option<DateTime<Utc>>>>,
    stream_rx: Option<mpsc::Receiver<StreamItem>>,
    result_rx: Option<oneshot::Receiver<(RunOutcome, Option<i32>)>>,
    cancel: CancellationToken,
}

/// Supervises agent sessions for every project this process is driving.
///
/// Generic over the process-spawning seam ([`AgentAdapter`]) and the clock,
/// the same way [`foreman_storage::Store`] is generic over its clock.
pub struct AgentSession<A: AgentAdapter, C: Clock> {
    adapter: Arc<A>,
    clock: C,
    config: Config,
    sessions: Mutex<HashMap<SessionId, SessionRecord>>,
    live_roles: Arc<Mutex<HashMap<(ProjectSlug, AgentRole), SessionId>>>,
}

impl<A: AgentAdapter, C: Clock> AgentSession<A, C> {
    pub fn new(adapter: A, clock: C, config: Config) -> Self {
        Self {
            adapter: Arc::new(adapter),
            clock,
            config,
            sessions: Mutex::new(HashMap::new()),
            live_roles: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn wall_timeout(&self, role: AgentRole) -> Duration {
        let secs = match role {
            AgentRole::Coding => self.config.default_coding_timeout_s,
            AgentRole::SpecAnalysis | AgentRole::Redesign | AgentRole::Analysis => {
                self.config.default_analysis_timeout_s
            }
        };
        Duration::from_secs(secs)
    }

    fn silence_timeout(&self) -> Duration {
        Duration::from_secs(self.config.silence_timeout_s)
    }

    /// Launch the configured binary for `role` against `workspace_path` with
    /// `prompt` on its stdin. Rejects with [`AgentSessionError::Busy`] if a
    /// session for this `(project, role)` is already live.
    pub async fn start(
        &self,
        project: &ProjectSlug,
        role: AgentRole,
        prompt: impl Into<String>,
        workspace_path: std::path::PathBuf,
        options: StartOptions,
    ) -> Result<SessionId, AgentSessionError> {
        let binary = self
            .config
            .agent_binaries
            .get(&role)
            .cloned()
            .ok_or(AgentSessionError::UnconfiguredRole(role))?;

        let key = (project.clone(), role);
        let reservation = SessionId::new();
        {
            let mut live_roles = self.live_roles.lock();
            if live_roles.contains_key(&key) {
                return Err(AgentSessionError::Busy { project: project.clone(), role });
            }
            // Reserve the slot before spawning so a second concurrent
            // `start` for the same (project, role) can't race past this
            // check while the first spawn is still in flight.
            live_roles.insert(key.clone(), reservation);
        }

        let request = SpawnRequest {
            project: project.clone(),
            role,
            prompt: prompt.into(),
            workspace_path,
            binary,
            options,
        };

        let process = match self.adapter.spawn(request).await {
            Ok(process) => process,
            Err(err) => {
                self.live_roles.lock().remove(&key);
                tracing::warn!(project = %project, %role, error = %err, "agent session failed to start");
                return Err(err);
            }
        };

        let session_id = reservation;
        let (stream_tx, stream_rx) = mpsc::channel(self.config.event_buffer_size.max(1));
        let (result_tx, result_rx) = oneshot::channel();
        let cancel = CancellationToken::new();
        let started_at = self.clock.now_utc();
        let state = Arc::new(Mutex::new(SessionState::Running));
        let last_line_at = Arc::new(Mutex::new(None));

        let timeouts = SessionTimeouts::new(self.wall_timeout(role), self.silence_timeout());
        let grace_period = Duration::from_secs(self.config.session_grace_period_s);

        self.sessions.lock().insert(
            session_id,
            SessionRecord { state: state.clone(), started_at, last_line_at: last_line_at.clone(), stream_rx: Some(stream_rx), result_rx: Some(result_rx), cancel: cancel.clone() },
        );

        tokio::spawn(drive_session(
            process,
            stream_tx,
            result_tx,
            timeouts,
            cancel,
            grace_period,
            state,
            last_line_at,
            self.live_roles.clone(),
            key,
        ));

        Ok(session_id)
    }

    /// Take ownership of the session's output stream. Can only be called
    /// once per session.
    pub fn stream(&self, session_id: SessionId) -> Result<mpsc::Receiver<StreamItem>, AgentSessionError> {
        let mut sessions = self.sessions.lock();
        let record = sessions.get_mut(&session_id).ok_or(AgentSessionError::NotFound(session_id))?;
        record.stream_rx.take().ok_or(AgentSessionError::StreamAlreadyTaken(session_id))
    }

    /// Await the session's terminal outcome, whether or not its stream has
    /// been drained.
    pub async fn join(&self, session_id: SessionId) -> Result<(RunOutcome, Option<i32>), AgentSessionError> {
        let result_rx = {
            let mut sessions = self.sessions.lock();
            let record = sessions.get_mut(&session_id).ok_or(AgentSessionError::NotFound(session_id))?;
            record.result_rx.take()
        };
        match result_rx {
            Some(rx) => Ok(rx.await.unwrap_or((RunOutcome::Error, None))),
            None => Err(AgentSessionError::StreamAlreadyTaken(session_id)),
        }
    }

    pub fn status(&self, session_id: SessionId) -> Result<SessionStatus, AgentSessionError> {
        let sessions = self.sessions.lock();
        let record = sessions.get(&session_id).ok_or(AgentSessionError::NotFound(session_id))?;
        Ok(SessionStatus {
            state: *record.state.lock(),
            started_at: record.started_at,
            last_line_at: *record.last_line_at.lock(),
        })
    }

    /// Request graceful termination: interrupt, wait the grace period, then
    /// force-kill. Idempotent — cancelling a terminated session is a no-op.
    pub fn cancel(&self, session_id: SessionId) -> Result<(), AgentSessionError> {
        let sessions = self.sessions.lock();
        let record = sessions.get(&session_id).ok_or(AgentSessionError::NotFound(session_id))?;
        tracing::info!(%session_id, "cancelling agent session");
        record.cancel.cancel();
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
async fn drive_session(
    mut process: Box<dyn SpawnedProcess>,
    stream_tx: mpsc::Sender<StreamItem>,
    result_tx: oneshot::Sender<(RunOutcome, Option<i32>)>,
    timeouts: SessionTimeouts,
    cancel: CancellationToken,
    grace_period: Duration,
    state: Arc<Mutex<SessionState>>,
    last_line_at: Arc<Mutex<Option<DateTime<Utc>>>>,
    live_roles: Arc<Mutex<HashMap<(ProjectSlug, AgentRole), SessionId>>>,
    live_role_key: (ProjectSlug, AgentRole),
) {
    let mut last_activity = Instant::now();
    let outcome;
    let mut exit_code = None;

    loop {
        tokio::select! {
            _ = timeouts.wall_clock_sleep() => {
                outcome = RunOutcome::Timeout;
                break;
            }
            _ = timeouts.silence_sleep(last_activity) => {
                outcome = RunOutcome::Timeout;
                break;
            }
            _ = cancel.cancelled() => {
                outcome = RunOutcome::Cancelled;
                break;
            }
            line = process.next_line() => {
                match line {
                    Some((which, text)) => {
                        last_activity = Instant::now();
                        *last_line_at.lock() = Some(Utc::now());
                        let item = StreamItem::Line { stream: which, line: text, timestamp: Utc::now() };
                        // Ignore a dropped receiver; keep draining so the
                        // process isn't starved on a full pipe.
                        let _ = stream_tx.send(item).await;
                    }
                    None => {
                        // Both pipes closed; the process may still be alive
                        // briefly before `wait()` observes its exit.
                        outcome = match process.wait().await {
                            Ok(code) => {
                                exit_code = code;
                                match code {
                                    Some(0) => RunOutcome::Success,
                                    Some(_) => RunOutcome::Failed,
                                    None => RunOutcome::Error,
                                }
                            }
                            Err(_) => RunOutcome::Error,
                        };
                        break;
                    }
                }
            }
        }
    }

    let outcome = finalize(&mut process, outcome, &mut exit_code, grace_period).await;
    tracing::info!(?outcome, ?exit_code, "agent session terminated");

    live_roles.lock().remove(&live_role_key);
    *state.lock() = SessionState::Terminated;
    let _ = stream_tx.send(StreamItem::Terminated { outcome, exit_code }).await;
    let _ = result_tx.send((outcome, exit_code));
}

/// For an in-progress termination (cancel or timeout), try the graceful
/// path first: interrupt, wait up to `grace_period`, then force-kill.
async fn finalize(
    process: &mut Box<dyn SpawnedProcess>,
    outcome: RunOutcome,
    exit_code: &mut Option<i32>,
    grace_period: Duration,
) -> RunOutcome {
    if !matches!(outcome, RunOutcome::Cancelled | RunOutcome::Timeout) {
        return outcome;
    }
    process.interrupt().await;
    let waited = tokio::time::timeout(grace_period, process.wait()).await;
    match waited {
        Ok(Ok(code)) => {
            *exit_code = code;
        }
        Ok(Err(_)) | Err(_) => {
            process.kill().await;
            *exit_code = process.wait().await.ok().flatten();
        }
    }
    outcome
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
