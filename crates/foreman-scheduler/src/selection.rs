// SPDX-License-Identifier: MIT

//! Pure feature-selection logic (§4.4 "Feature selection").

use foreman_core::Feature;

/// Pick the next feature to dispatch from a project's `pending` features:
/// `needs_review`-flagged features first, then lowest id. `pending` is
/// assumed to already be in id order (as `Store::list_features` returns it).
///
/// A feature that has exhausted its retry cap is excluded from
/// auto-reselection even while still flagged `needs_review`: it only sorts
/// first again once an operator clears the flag (§4.4 retry policy). If
/// every pending feature is retry-cap-exhausted, `select_next` returns
/// `None` and the scheduler goes idle rather than looping on it forever.
pub fn select_next(pending: &[Feature], retry_cap: u32) -> Option<&Feature> {
    let mut selectable = pending.iter().filter(|f| !f.retries_exhausted(retry_cap));
    selectable.clone().find(|f| f.needs_review).or_else(|| selectable.next())
}

#[cfg(test)]
#[path = "selection_tests.rs"]
mod tests;
