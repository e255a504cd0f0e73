// SPDX-License-Identifier: MIT

//! Jaccard token similarity, used by SpecPipeline's dedup pass (§4.5, §8
//! property 6) to decide whether a generated feature candidate matches an
//! existing feature closely enough to merge instead of create.

use std::collections::HashSet;

/// Lowercase, whitespace/punctuation-split token set for similarity scoring.
fn tokenize(s: &str) -> HashSet<String> {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|tok| !tok.is_empty())
        .map(|tok| tok.to_string())
        .collect()
}

/// Jaccard similarity (`|A ∩ B| / |A ∪ B|`) between the token sets of two
/// strings. Returns `1.0` when both are empty, `0.0` when exactly one is.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);

    if tokens_a.is_empty() && tokens_b.is_empty() {
        return 1.0;
    }
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    intersection as f64 / union as f64
}

/// Whether `a` and `b` are similar enough to be treated as the same feature,
/// per the configured dedup threshold (§6 `dedup_similarity_threshold`).
pub fn is_duplicate(a: &str, b: &str, threshold: f64) -> bool {
    jaccard_similarity(a, b) >= threshold
}

#[cfg(test)]
#[path = "similarity_tests.rs"]
mod tests;
