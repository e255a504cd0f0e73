// SPDX-License-Identifier: MIT

//! Prompt composition for a dispatched coding session (§4.4 "Dispatch").

use foreman_core::Feature;

/// Compose the prompt passed to the coding `AgentSession`: the project
/// app-spec, the selected feature's description and steps, and a short
/// summary of the most recently completed features, capped at `budget`.
pub fn compose_prompt(app_spec: &str, feature: &Feature, recently_done: &[Feature], budget: usize) -> String {
    let mut out = String::new();
    out.push_str("# Application specification\n\n");
    out.push_str(app_spec);
    out.push_str("\n\n# Feature to implement\n\n");
    out.push_str(&format!("**{}** ({})\n\n", feature.name, feature.category));
    out.push_str(&feature.description);
    out.push('\n');
    if !feature.steps.is_empty() {
        out.push_str("\nSteps:\n");
        for step in &feature.steps {
            out.push_str(&format!("- {step}\n"));
        }
    }

    if !recently_done.is_empty() {
        out.push_str("\n# Recently completed features\n\n");
        for done in recently_done.iter().rev().take(budget) {
            out.push_str(&format!("- {}: {}\n", done.name, done.description));
        }
    }

    out
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
