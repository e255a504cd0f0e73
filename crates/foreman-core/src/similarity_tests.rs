// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn identical_strings_score_one() {
    assert_eq!(jaccard_similarity("user login flow", "user login flow"), 1.0);
}

#[test]
fn disjoint_strings_score_zero() {
    assert_eq!(jaccard_similarity("user login", "billing invoice"), 0.0);
}

#[test]
fn overlapping_strings_score_between_zero_and_one() {
    let score = jaccard_similarity("user login with email", "user login with phone number");
    assert!(score > 0.0 && score < 1.0);
}

#[test]
fn both_empty_scores_one() {
    assert_eq!(jaccard_similarity("", ""), 1.0);
}

#[test]
fn one_empty_scores_zero() {
    assert_eq!(jaccard_similarity("", "login"), 0.0);
}

#[test]
fn is_duplicate_respects_threshold() {
    assert!(is_duplicate("user login flow", "user login flow", 0.85));
    assert!(!is_duplicate("user login", "billing export", 0.85));
}

#[test]
fn tokenization_is_case_and_punctuation_insensitive() {
    assert_eq!(jaccard_similarity("User Login!", "user, login"), 1.0);
}
