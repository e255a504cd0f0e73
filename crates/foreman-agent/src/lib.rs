// SPDX-License-Identifier: MIT

//! The agent-session supervisor (§4.3): launches the external coding agent
//! as a child process, streams its output line by line, and enforces the
//! wall-clock and silence timeouts independent of anything the process
//! itself reports.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod adapter;
mod error;
mod process;
mod session;
mod timeout;
mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use adapter::{AgentAdapter, SpawnRequest, SpawnedProcess};
pub use error::AgentSessionError;
pub use process::ProcessAgentAdapter;
pub use session::AgentSession;
pub use types::{OutputStream, SessionState, SessionStatus, StartOptions, StreamItem};
