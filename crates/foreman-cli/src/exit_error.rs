// SPDX-License-Identifier: MIT

//! Custom error type that carries a process exit code (§6 "CLI exit codes").
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, so `main()` is the only place that terminates the process.

use foreman_controller::ControllerError;
use std::fmt;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

/// Maps `ControllerError` onto the exit-code contract: 0 success, 2 invalid
/// argument, 3 invariant violation, 4 not found, 5 concurrent conflict, 1
/// generic error.
impl From<ControllerError> for ExitError {
    fn from(err: ControllerError) -> Self {
        let code = match &err {
            ControllerError::Validation(_) => 2,
            ControllerError::ProjectNotFound(_) => 4,
            ControllerError::AlreadyRegistered(_)
            | ControllerError::WorkspaceInUse(_)
            | ControllerError::NotReadyToBuild(_)
            | ControllerError::UpdateWhileInFlight(..)
            | ControllerError::SpecInputsNotSet(_) => 3,
            ControllerError::ConcurrentSessionConflict(..) => 5,
            ControllerError::Store(foreman_storage::StoreError::FeatureNotFound(..)) => 4,
            ControllerError::Store(foreman_storage::StoreError::InvalidProjectTransition(..))
            | ControllerError::Store(foreman_storage::StoreError::InvalidFeatureTransition(..))
            | ControllerError::Store(foreman_storage::StoreError::Concurrency(..)) => 3,
            _ => 1,
        };
        Self::new(code, err.to_string())
    }
}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
