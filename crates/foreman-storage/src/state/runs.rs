// SPDX-License-Identifier: MIT

//! Run event handlers.

use foreman_core::{Event, EventKind};

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match &event.kind {
        EventKind::RunStarted { run } => {
            if !state.runs.contains_key(&run.id) {
                state.runs.insert(run.id, run.clone());
            }
        }
        EventKind::RunFinished { run_id, feature_id, outcome, exit_code } => {
            if let Some(run) = state.runs.get_mut(run_id) {
                if !run.is_finished() {
                    let ended_at = event.timestamp.timestamp_millis().max(0) as u64;
                    run.finish(ended_at, *outcome, *exit_code);
                }
            }
            if let Some(feature) = state.features.get_mut(feature_id) {
                feature.last_run = Some(*run_id);
            }
        }
        _ => {}
    }
}
