// SPDX-License-Identifier: MIT

//! Deduplicating generated feature candidates and ranking them against
//! existing features (§4.5 step 3, and the spec-update "match candidates"
//! step).

use foreman_core::{similarity::jaccard_similarity, Feature, FeatureCandidate, MatchCandidate};

fn candidate_key(candidate: &FeatureCandidate) -> String {
    format!("{} {}", candidate.category, candidate.name)
}

/// Collapse candidates whose normalized-name similarity is at or above
/// `threshold`, keeping the first occurrence and merging later duplicates'
/// steps into it (§4.5 "Deduplicate candidates by normalized-name
/// similarity... threshold default 0.85").
pub fn dedup_candidates(candidates: Vec<FeatureCandidate>, threshold: f64) -> Vec<FeatureCandidate> {
    let mut kept: Vec<FeatureCandidate> = Vec::new();
    for candidate in candidates {
        let key = candidate_key(&candidate);
        if let Some(existing) = kept.iter_mut().find(|k| jaccard_similarity(&candidate_key(k), &key) >= threshold) {
            for step in candidate.steps {
                if !existing.steps.contains(&step) {
                    existing.steps.push(step);
                }
            }
        } else {
            kept.push(candidate);
        }
    }
    kept
}

/// Post-process a deduplicated candidate list to fit a caller-supplied
/// target range (§4.5 "Feature count target"): merge the most-similar
/// adjacent pair repeatedly to shrink, or split the largest candidate's
/// steps in half repeatedly to grow. A `None` target leaves the list as-is
/// except for a `sanity_cap` warning, left to the caller to log.
pub fn fit_to_target(mut candidates: Vec<FeatureCandidate>, target: Option<(usize, usize)>) -> Vec<FeatureCandidate> {
    let Some((min, max)) = target else {
        return candidates;
    };

    while candidates.len() > max && candidates.len() > 1 {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..candidates.len() {
            for j in (i + 1)..candidates.len() {
                let sim = jaccard_similarity(&candidate_key(&candidates[i]), &candidate_key(&candidates[j]));
                if best.map_or(true, |(_, _, b)| sim > b) {
                    best = Some((i, j, sim));
                }
            }
        }
        let Some((i, j, _)) = best else { break };
        let merged_steps = candidates[j].steps.clone();
        for step in merged_steps {
            if !candidates[i].steps.contains(&step) {
                candidates[i].steps.push(step);
            }
        }
        candidates.remove(j);
    }

    while candidates.len() < min {
        let Some((idx, _)) = candidates.iter().enumerate().max_by_key(|(_, c)| c.steps.len()) else { break };
        if candidates[idx].steps.len() < 2 {
            break; // nothing left big enough to split
        }
        let mut candidate = candidates[idx].clone();
        let split_at = candidate.steps.len() / 2;
        let second_steps = candidate.steps.split_off(split_at);
        let mut second = candidate.clone();
        second.name = format!("{} (part 2)", candidate.name);
        second.steps = second_steps;
        candidates[idx] = candidate;
        candidates.insert(idx + 1, second);
    }

    candidates
}

/// Rank the top-`top_k` existing features most similar to `candidate`, by
/// Jaccard similarity over name tokens plus step-set overlap (§4.5 "rank
/// top-K... by similarity (same Jaccard scheme plus step-set overlap)").
pub fn rank_matches(candidate: &FeatureCandidate, existing: &[Feature], top_k: usize) -> Vec<MatchCandidate> {
    let candidate_steps = candidate.steps.join(" ");
    let mut scored: Vec<(f64, &Feature)> = existing
        .iter()
        .map(|feature| {
            let name_sim = jaccard_similarity(&candidate_key_for(&candidate.category, &candidate.name), &format!("{} {}", feature.category, feature.name));
            let step_sim = jaccard_similarity(&candidate_steps, &feature.steps.join(" "));
            (0.7 * name_sim + 0.3 * step_sim, feature)
        })
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().take(top_k).map(|(similarity, feature)| MatchCandidate { feature_id: feature.id, similarity }).collect()
}

fn candidate_key_for(category: &str, name: &str) -> String {
    format!("{category} {name}")
}

#[cfg(test)]
#[path = "dedup_tests.rs"]
mod tests;
