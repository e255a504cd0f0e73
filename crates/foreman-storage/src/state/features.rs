// SPDX-License-Identifier: MIT

//! Feature event handlers.

use foreman_core::{Event, EventKind};

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match &event.kind {
        EventKind::FeatureCreated { feature } => {
            // Idempotency: a replayed create for an id we already have is a no-op.
            if !state.features.contains_key(&feature.id) {
                if feature.id.0 >= state.next_feature_id {
                    state.next_feature_id = feature.id.0 + 1;
                }
                state.features.insert(feature.id, feature.clone());
            }
        }
        EventKind::FeatureTransitioned { feature_id, to, passes, needs_review, retry_count, category, name, description, steps } => {
            if let Some(f) = state.features.get_mut(feature_id) {
                f.state = *to;
                f.passes = *passes;
                f.needs_review = *needs_review;
                f.retry_count = *retry_count;
                f.category = category.clone();
                f.name = name.clone();
                f.description = description.clone();
                f.steps = steps.clone();
            }
        }
        _ => {}
    }
}
