// SPDX-License-Identifier: MIT

use super::*;
use foreman_core::FeatureId;

fn feature(id: u64, needs_review: bool) -> Feature {
    let mut f = Feature::new(FeatureId::new(id), "core", format!("feature-{id}"));
    f.needs_review = needs_review;
    f
}

fn feature_with_retries(id: u64, needs_review: bool, retry_count: u32) -> Feature {
    let mut f = feature(id, needs_review);
    f.retry_count = retry_count;
    f
}

#[test]
fn picks_lowest_id_when_nothing_is_flagged() {
    let pending = vec![feature(1, false), feature(2, false), feature(3, false)];
    assert_eq!(select_next(&pending, 3).unwrap().id, FeatureId::new(1));
}

#[test]
fn a_flagged_feature_jumps_the_queue() {
    let pending = vec![feature(1, false), feature(2, true), feature(3, false)];
    assert_eq!(select_next(&pending, 3).unwrap().id, FeatureId::new(2));
}

#[test]
fn ties_among_flagged_features_break_by_id_ascending() {
    // `pending` is assumed id-ordered, as `Store::list_features` returns it.
    let pending = vec![feature(2, true), feature(5, true)];
    assert_eq!(select_next(&pending, 3).unwrap().id, FeatureId::new(2));
}

#[test]
fn empty_pending_list_selects_nothing() {
    let pending: Vec<Feature> = Vec::new();
    assert!(select_next(&pending, 3).is_none());
}

#[test]
fn retry_cap_exhausted_feature_is_excluded_even_when_flagged() {
    let pending = vec![feature_with_retries(1, true, 3), feature(2, false)];
    assert_eq!(select_next(&pending, 3).unwrap().id, FeatureId::new(2));
}

#[test]
fn all_pending_retry_cap_exhausted_selects_nothing() {
    let pending = vec![feature_with_retries(1, true, 3), feature_with_retries(2, true, 5)];
    assert!(select_next(&pending, 3).is_none());
}
