// SPDX-License-Identifier: MIT

//! Cold-start recovery: reattach every project the Store already knows about
//! when the process restarts, so a project mid-build doesn't silently stop
//! making progress just because nothing holds its [`crate::registry::Registry`]
//! entry anymore.

use crate::controller::ProjectController;
use crate::error::ControllerError;
use foreman_agent::AgentAdapter;
use foreman_core::{Clock, FeatureState, ProjectSlug};
use foreman_scheduler::VerificationHook;

impl<A, C, V> ProjectController<A, C, V>
where
    A: AgentAdapter + 'static,
    C: Clock + 'static,
    V: VerificationHook + 'static,
{
    /// Re-spawn a scheduler and lifecycle watcher for every project found
    /// under the configured `projects_root`, in whatever state each one was
    /// last left in. Call once, before serving any verbs, on process startup.
    ///
    /// Any feature left `in_progress` is reverted to `pending` first: the
    /// AgentSession driving it cannot have survived the restart, so it is
    /// treated as orphaned rather than silently resumed as still-live.
    pub fn recover_on_startup(&self) -> Result<Vec<ProjectSlug>, ControllerError> {
        let mut recovered = Vec::new();
        for slug in self.store.discover_existing_projects()? {
            let groups = self.store.list_features(&slug, None)?;
            for orphaned in groups.in_progress {
                self.store.transition_feature(&slug, orphaned.id, FeatureState::Pending, orphaned.passes)?;
            }
            let project = self.store.get_project(&slug)?;
            self.attach(project)?;
            recovered.push(slug);
        }
        Ok(recovered)
    }
}
