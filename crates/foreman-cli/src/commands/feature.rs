// SPDX-License-Identifier: MIT

//! `foreman feature` — inspect and nudge individual features.

use crate::commands::project::parse_slug;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, handle_list, OutputFormat};
use crate::Harness;
use clap::{Subcommand, ValueEnum};
use foreman_core::{Feature, FeatureId};
use foreman_storage::FeatureFilter;

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
pub enum FeatureStateArg {
    Pending,
    InProgress,
    Done,
}

#[derive(Subcommand)]
pub enum FeatureCommand {
    /// List a project's features, grouped by lifecycle state.
    List {
        slug: String,
        /// Show only one lifecycle group instead of all three.
        #[arg(long, value_enum)]
        state: Option<FeatureStateArg>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Re-dispatch a feature that is pending or was left in progress.
    Restart { slug: String, feature_id: u64 },
    /// Mark a feature done without running it (operator override).
    Skip { slug: String, feature_id: u64 },
}

pub async fn dispatch(harness: &Harness, command: FeatureCommand, format: OutputFormat) -> Result<(), ExitError> {
    match command {
        FeatureCommand::List { slug, state, category } => {
            let slug = parse_slug(&slug)?;
            let filter = category.map(|category| FeatureFilter { category: Some(category), needs_review: None });
            let groups = harness.list_features(&slug, filter.as_ref())?;
            let all: Vec<Feature> = match state {
                Some(FeatureStateArg::Pending) => groups.pending,
                Some(FeatureStateArg::InProgress) => groups.in_progress,
                Some(FeatureStateArg::Done) => groups.done,
                None => groups.pending.into_iter().chain(groups.in_progress).chain(groups.done).collect(),
            };
            handle_list(format, &all, "no features", |features| {
                for f in features {
                    println!("{:>6}  {:<12}  {:<10}  {}", f.id, f.state, f.category, f.name);
                }
            })?;
        }
        FeatureCommand::Restart { slug, feature_id } => {
            let slug = parse_slug(&slug)?;
            harness.restart_feature(&slug, FeatureId::new(feature_id)).await?;
            format_or_json(format, &feature_id, || println!("restarted feature {feature_id}"))?;
        }
        FeatureCommand::Skip { slug, feature_id } => {
            let slug = parse_slug(&slug)?;
            harness.skip_feature(&slug, FeatureId::new(feature_id)).await?;
            format_or_json(format, &feature_id, || println!("skipped feature {feature_id}"))?;
        }
    }
    Ok(())
}
