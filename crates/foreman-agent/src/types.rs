// SPDX-License-Identifier: MIT

//! Shared value types for the agent-session supervisor (§4.3).

use chrono::{DateTime, Utc};
use foreman_core::RunOutcome;
use serde::{Deserialize, Serialize};

/// Which pipe a captured line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Options layered on top of the mandatory `(project, role, prompt)` triple.
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    pub model: Option<String>,
    pub extra_args: Vec<String>,
}

/// A point-in-time snapshot of where a session sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Starting,
    Running,
    Terminating,
    Terminated,
}

/// A single item from [`crate::session::AgentSession::stream`]: either one
/// captured line, or the terminal record that ends the sequence.
#[derive(Debug, Clone)]
pub enum StreamItem {
    Line { stream: OutputStream, line: String, timestamp: DateTime<Utc> },
    Terminated { outcome: RunOutcome, exit_code: Option<i32> },
}

/// Point-in-time status, for [`crate::session::AgentSession::status`].
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub state: SessionState,
    pub started_at: DateTime<Utc>,
    pub last_line_at: Option<DateTime<Utc>>,
}
