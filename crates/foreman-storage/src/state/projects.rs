// SPDX-License-Identifier: MIT

//! Project event handlers.

use foreman_core::{Event, EventKind};

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match &event.kind {
        EventKind::ProjectStateChanged { to, .. } => {
            if let Some(project) = state.project.as_mut() {
                // Idempotency: replaying the same transition twice is a no-op.
                if project.state != *to {
                    project.state = *to;
                }
                project.updated_at_ms = event.timestamp.timestamp_millis().max(0) as u64;
            }
        }
        EventKind::SpecUpdated { app_spec, analysis_id, .. } => {
            if let Some(project) = state.project.as_mut() {
                project.app_spec = app_spec.clone();
                project.updated_at_ms = event.timestamp.timestamp_millis().max(0) as u64;
            }
            state.applied_spec_updates.insert(*analysis_id);
        }
        _ => {}
    }
}
