// SPDX-License-Identifier: MIT

//! Per-project bookkeeping: the scheduler handle, the AgentSession slots it
//! owns, and the per-workspace exclusivity lock (§5 "AgentSession's working
//! directory is owned exclusively by the active session for that project").

use crate::error::ControllerError;
use foreman_agent::AgentAdapter;
use foreman_core::{AgentRole, Clock, ProjectSlug};
use foreman_scheduler::{FeatureScheduler, VerificationHook};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything [`crate::controller::ProjectController`] keeps per registered
/// project, beyond what's durable in the Store. `A`/`V` stay as markers here
/// since the controller owns the actual `AgentSession`/verifier instances,
/// shared across every project they drive.
pub(crate) struct ProjectEntry<A: AgentAdapter, C: Clock, V: VerificationHook> {
    pub workspace_path: PathBuf,
    pub scheduler: FeatureScheduler,
    /// Role of the AgentSession the controller itself currently has in
    /// flight for this project (spec_analysis/redesign/analysis), if any.
    /// `coding` sessions are owned by the scheduler and not tracked here;
    /// conflicts against `coding` are checked via the scheduler's own
    /// in-flight state instead (§4.6's role-conflict invariant needs both).
    active_role: Mutex<Option<AgentRole>>,
    /// The free-form document staged by `set_spec_inputs`, consumed by the
    /// next `generate_features` call.
    pub pending_spec_input: Mutex<Option<String>>,
    _marker: PhantomData<(A, C, V)>,
}

impl<A: AgentAdapter, C: Clock, V: VerificationHook> ProjectEntry<A, C, V> {
    pub fn new(workspace_path: PathBuf, scheduler: FeatureScheduler) -> Self {
        Self {
            workspace_path,
            scheduler,
            active_role: Mutex::new(None),
            pending_spec_input: Mutex::new(None),
            _marker: PhantomData,
        }
    }

    fn reserve(&self, slug: &ProjectSlug, role: AgentRole) -> Result<(), ControllerError> {
        if self.scheduler.status().state.is_in_flight() {
            return Err(ControllerError::ConcurrentSessionConflict(AgentRole::Coding, slug.clone()));
        }
        let mut active = self.active_role.lock();
        if let Some(held) = *active {
            return Err(ControllerError::ConcurrentSessionConflict(held, slug.clone()));
        }
        *active = Some(role);
        Ok(())
    }

    fn release(&self, role: AgentRole) {
        let mut active = self.active_role.lock();
        if *active == Some(role) {
            *active = None;
        }
    }
}

/// Reserve `entry`'s non-coding AgentSession slot for `role`, rejecting if a
/// coding session is in flight (scheduler dispatching, awaiting_agent, or
/// verifying) or another non-coding session already holds the slot (§4.6
/// "role-conflicting AgentSession request"). The slot is released when the
/// returned guard drops, however the guarded operation ends.
pub(crate) fn begin_session<A: AgentAdapter, C: Clock, V: VerificationHook>(
    entry: &Arc<ProjectEntry<A, C, V>>,
    slug: &ProjectSlug,
    role: AgentRole,
) -> Result<SessionGuard<A, C, V>, ControllerError> {
    entry.reserve(slug, role)?;
    Ok(SessionGuard { entry: entry.clone(), role })
}

/// Releases a project's non-coding AgentSession slot when dropped, however
/// the guarded operation ends (success, error, or early return).
pub(crate) struct SessionGuard<A: AgentAdapter, C: Clock, V: VerificationHook> {
    entry: Arc<ProjectEntry<A, C, V>>,
    role: AgentRole,
}

impl<A: AgentAdapter, C: Clock, V: VerificationHook> Drop for SessionGuard<A, C, V> {
    fn drop(&mut self) {
        self.entry.release(self.role);
    }
}

/// Registered projects and the workspace paths they've claimed.
pub(crate) struct Registry<A: AgentAdapter, C: Clock, V: VerificationHook> {
    entries: Mutex<HashMap<ProjectSlug, Arc<ProjectEntry<A, C, V>>>>,
    workspaces: Mutex<HashMap<PathBuf, ProjectSlug>>,
}

impl<A: AgentAdapter, C: Clock, V: VerificationHook> Default for Registry<A, C, V> {
    fn default() -> Self {
        Self { entries: Mutex::new(HashMap::new()), workspaces: Mutex::new(HashMap::new()) }
    }
}

impl<A: AgentAdapter, C: Clock, V: VerificationHook> Registry<A, C, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, slug: ProjectSlug, entry: ProjectEntry<A, C, V>) -> Result<Arc<ProjectEntry<A, C, V>>, ControllerError> {
        let mut entries = self.entries.lock();
        if entries.contains_key(&slug) {
            return Err(ControllerError::AlreadyRegistered(slug));
        }
        let mut workspaces = self.workspaces.lock();
        if let Some(owner) = workspaces.get(&entry.workspace_path) {
            if owner != &slug {
                return Err(ControllerError::WorkspaceInUse(entry.workspace_path));
            }
        }
        workspaces.insert(entry.workspace_path.clone(), slug.clone());
        let entry = Arc::new(entry);
        entries.insert(slug, entry.clone());
        Ok(entry)
    }

    pub fn get(&self, slug: &ProjectSlug) -> Result<Arc<ProjectEntry<A, C, V>>, ControllerError> {
        self.entries.lock().get(slug).cloned().ok_or_else(|| ControllerError::ProjectNotFound(slug.clone()))
    }
}
