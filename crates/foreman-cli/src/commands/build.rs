// SPDX-License-Identifier: MIT

//! `foreman build` — start/pause/resume/stop a project's scheduler.

use crate::commands::project::parse_slug;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};
use crate::Harness;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum BuildCommand {
    /// Start the scheduler (requires spec_ready with ≥1 pending feature).
    Start { slug: String },
    Pause { slug: String },
    Resume { slug: String },
    Stop { slug: String },
}

pub async fn dispatch(harness: &Harness, command: BuildCommand, format: OutputFormat) -> Result<(), ExitError> {
    let (slug_raw, verb): (String, &str) = match &command {
        BuildCommand::Start { slug } => (slug.clone(), "start_build"),
        BuildCommand::Pause { slug } => (slug.clone(), "pause"),
        BuildCommand::Resume { slug } => (slug.clone(), "resume"),
        BuildCommand::Stop { slug } => (slug.clone(), "stop"),
    };
    let slug = parse_slug(&slug_raw)?;
    match command {
        BuildCommand::Start { .. } => harness.start_build(&slug).await?,
        BuildCommand::Pause { .. } => harness.pause(&slug).await?,
        BuildCommand::Resume { .. } => harness.resume(&slug).await?,
        BuildCommand::Stop { .. } => harness.stop(&slug).await?,
    }
    format_or_json(format, &slug, || println!("{verb} ok for {:?}", slug))?;
    Ok(())
}
