// SPDX-License-Identifier: MIT

//! `foreman project` — register, import, and inspect projects.

use crate::exit_error::ExitError;
use crate::output::{format_or_json, handle_list, OutputFormat};
use crate::Harness;
use clap::{Subcommand, ValueEnum};
use foreman_core::{ProjectSlug, ReferenceSessionId, SpecMethod};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SpecMethodArg {
    Natural,
    Structured,
    Manual,
}

impl From<SpecMethodArg> for SpecMethod {
    fn from(arg: SpecMethodArg) -> Self {
        match arg {
            SpecMethodArg::Natural => SpecMethod::Natural,
            SpecMethodArg::Structured => SpecMethod::Structured,
            SpecMethodArg::Manual => SpecMethod::Manual,
        }
    }
}

#[derive(Subcommand)]
pub enum ProjectCommand {
    /// Register a new project over a fresh workspace.
    Register {
        slug: String,
        workspace: PathBuf,
        #[arg(long, value_enum, default_value = "natural")]
        spec_method: SpecMethodArg,
    },
    /// Register a project over a workspace that already has a codebase.
    ImportExisting { slug: String, workspace: PathBuf },
    /// List every project the Store knows about.
    List,
    /// Show a project's scheduler status.
    Status { slug: String },
    /// Stage the document `generate_features` will consume next.
    SetSpecInputs {
        slug: String,
        /// Inline text. Mutually exclusive with `--file`.
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        /// Read the document from a file instead of `--text`.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Run initial generation over the staged spec inputs.
    GenerateFeatures {
        slug: String,
        #[arg(long)]
        target_min: Option<usize>,
        #[arg(long)]
        target_max: Option<usize>,
    },
    /// Run an `analysis` session over the workspace and record its components.
    StartReferenceSession { slug: String, prompt: String },
    /// Turn a reference session's components into pending features.
    GenerateFeaturesFromReferences { slug: String, reference_session_id: String },
    /// Run a `redesign` session to completion.
    StartRedesign { slug: String, prompt: String },
}

pub async fn dispatch(harness: &Harness, command: ProjectCommand, format: OutputFormat) -> Result<(), ExitError> {
    match command {
        ProjectCommand::Register { slug, workspace, spec_method } => {
            let slug = parse_slug(&slug)?;
            let project = harness.register(slug, workspace, spec_method.into())?;
            format_or_json(format, &project, || println!("registered {:?}", project.slug))?;
        }
        ProjectCommand::ImportExisting { slug, workspace } => {
            let slug = parse_slug(&slug)?;
            let project = harness.import_existing(slug, workspace)?;
            format_or_json(format, &project, || println!("registered {:?}", project.slug))?;
        }
        ProjectCommand::List => {
            let slugs = harness.list_projects()?;
            handle_list(format, &slugs, "no projects", |slugs| {
                for slug in slugs {
                    println!("{}", slug.as_str());
                }
            })?;
        }
        ProjectCommand::Status { slug } => {
            let slug = parse_slug(&slug)?;
            let status = harness.status(&slug)?;
            format_or_json(format, &status, || println!("{:?} current={:?}", status.state, status.current_feature))?;
        }
        ProjectCommand::SetSpecInputs { slug, text, file } => {
            let slug = parse_slug(&slug)?;
            let input = match (text, file) {
                (Some(text), None) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .map_err(|e| ExitError::new(1, format!("reading {}: {e}", path.display())))?,
                _ => return Err(ExitError::new(2, "exactly one of --text or --file is required")),
            };
            harness.set_spec_inputs(&slug, input)?;
            format_or_json(format, &slug, || println!("spec inputs staged for {:?}", slug))?;
        }
        ProjectCommand::GenerateFeatures { slug, target_min, target_max } => {
            let slug = parse_slug(&slug)?;
            let target = match (target_min, target_max) {
                (Some(min), Some(max)) => Some((min, max)),
                (None, None) => None,
                _ => return Err(ExitError::new(2, "--target-min and --target-max must be given together")),
            };
            let count = harness.generate_features(&slug, target).await?;
            format_or_json(format, &count, || println!("generated {count} features"))?;
        }
        ProjectCommand::StartReferenceSession { slug, prompt } => {
            let slug = parse_slug(&slug)?;
            let session = harness.start_reference_session(&slug, prompt).await?;
            format_or_json(format, &session, || println!("reference session {:?}", session.id))?;
        }
        ProjectCommand::GenerateFeaturesFromReferences { slug, reference_session_id } => {
            let slug = parse_slug(&slug)?;
            let id = ReferenceSessionId::from_string(reference_session_id);
            let count = harness.generate_features_from_references(&slug, &id)?;
            format_or_json(format, &count, || println!("generated {count} features"))?;
        }
        ProjectCommand::StartRedesign { slug, prompt } => {
            let slug = parse_slug(&slug)?;
            let outcome = harness.start_redesign(&slug, prompt).await?;
            format_or_json(format, &outcome, || println!("{outcome:?}"))?;
        }
    }
    Ok(())
}

pub fn parse_slug(raw: &str) -> Result<ProjectSlug, ExitError> {
    ProjectSlug::parse(raw).map_err(|e| ExitError::new(2, e.to_string()))
}
