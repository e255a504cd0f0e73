// SPDX-License-Identifier: MIT

use super::*;
use foreman_core::{Feature, FeatureId, SourceSpec};

fn candidate(category: &str, name: &str, steps: &[&str]) -> FeatureCandidate {
    FeatureCandidate {
        category: category.into(),
        name: name.into(),
        description: String::new(),
        steps: steps.iter().map(|s| s.to_string()).collect(),
        source_spec: SourceSpec::Generated,
    }
}

#[test]
fn near_duplicate_names_collapse_into_one() {
    let candidates = vec![
        candidate("core", "Add button to toolbar", &["render", "wire click"]),
        candidate("core", "Add button to the toolbar", &["wire click", "persist state"]),
    ];
    let deduped = dedup_candidates(candidates, 0.85);
    assert_eq!(deduped.len(), 1);
    assert_eq!(deduped[0].steps.len(), 3);
}

#[test]
fn distinct_names_are_kept_separate() {
    let candidates = vec![candidate("core", "Add button", &[]), candidate("core", "Persist clicks", &[])];
    assert_eq!(dedup_candidates(candidates, 0.85).len(), 2);
}

#[test]
fn fit_to_target_merges_down_to_max() {
    let candidates = vec![
        candidate("core", "alpha", &["a"]),
        candidate("core", "beta", &["b"]),
        candidate("core", "gamma", &["c"]),
    ];
    let fitted = fit_to_target(candidates, Some((1, 2)));
    assert_eq!(fitted.len(), 2);
}

#[test]
fn fit_to_target_splits_up_to_min() {
    let candidates = vec![candidate("core", "big one", &["s1", "s2", "s3", "s4"])];
    let fitted = fit_to_target(candidates, Some((2, 5)));
    assert_eq!(fitted.len(), 2);
    assert!(fitted.iter().all(|c| !c.steps.is_empty()));
}

#[test]
fn no_target_leaves_candidates_untouched() {
    let candidates = vec![candidate("core", "alpha", &[])];
    assert_eq!(fit_to_target(candidates.clone(), None), candidates);
}

#[test]
fn rank_matches_orders_by_similarity() {
    let existing = vec![
        Feature::builder().id(FeatureId::new(1)).category("core").name("Add button").build(),
        Feature::builder().id(FeatureId::new(2)).category("core").name("Persist clicks").build(),
    ];
    let candidate = candidate("core", "Add button", &[]);
    let matches = rank_matches(&candidate, &existing, 5);
    assert_eq!(matches[0].feature_id, FeatureId::new(1));
}
