// SPDX-License-Identifier: MIT

//! `foreman` — a thin CLI surface over `ProjectController` (§4.6): the
//! harness's own smoke-test surface, not the product's UI.

mod commands;
mod exit_error;
mod output;

use clap::{Parser, Subcommand};
use commands::{build, feature, project, spec};
use exit_error::ExitError;
use foreman_agent::{AgentSession, ProcessAgentAdapter};
use foreman_core::{Config, SystemClock};
use foreman_controller::ProjectController;
use foreman_eventbus::EventBus;
use foreman_scheduler::CommandVerificationHook;
use foreman_storage::Store;
use output::OutputFormat;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// The concrete `ProjectController` this binary drives: a real child-process
/// agent adapter, the wall clock, and a shell-command verification hook.
pub type Harness = ProjectController<ProcessAgentAdapter, SystemClock, CommandVerificationHook>;

#[derive(Parser)]
#[command(name = "foreman", about = "Autonomous feature-build harness control plane")]
struct Cli {
    /// Path to `foreman.toml`. Defaults to `./foreman.toml`.
    #[arg(long, global = true, default_value = "foreman.toml")]
    config: PathBuf,

    /// Shell command run to verify a feature after each coding session.
    #[arg(long, global = true, default_value = "true")]
    verify_command: String,

    /// Arguments passed to `--verify-command`.
    #[arg(long = "verify-arg", global = true)]
    verify_args: Vec<String>,

    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(subcommand)]
    Project(project::ProjectCommand),
    #[command(subcommand)]
    Build(build::BuildCommand),
    #[command(subcommand)]
    Feature(feature::FeatureCommand),
    #[command(subcommand)]
    Spec(spec::SpecCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

async fn run(cli: Cli) -> Result<(), ExitError> {
    let config = load_config(&cli.config)?;
    let harness = build_harness(&config, cli.verify_command, cli.verify_args);

    let recovered = harness.recover_on_startup()?;
    for slug in &recovered {
        tracing::info!(project = %slug.as_str(), "recovered project at startup");
    }

    match cli.command {
        Command::Project(command) => project::dispatch(&harness, command, cli.format).await,
        Command::Build(command) => build::dispatch(&harness, command, cli.format).await,
        Command::Feature(command) => feature::dispatch(&harness, command, cli.format).await,
        Command::Spec(command) => spec::dispatch(&harness, command, cli.format).await,
    }
}

fn load_config(path: &PathBuf) -> Result<Config, ExitError> {
    match std::fs::read_to_string(path) {
        Ok(raw) => Config::from_toml_str(&raw).map_err(|e| ExitError::new(2, format!("parsing {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExitError::new(2, format!("no config file at {} (pass --config)", path.display())))
        }
        Err(e) => Err(ExitError::new(1, format!("reading {}: {e}", path.display()))),
    }
}

fn build_harness(config: &Config, verify_command: String, verify_args: Vec<String>) -> Harness {
    let clock = SystemClock;
    let store = Arc::new(Store::new(config, clock.clone()));
    let bus = Arc::new(EventBus::new(store.clone()));
    let agents = Arc::new(AgentSession::new(ProcessAgentAdapter::new(), clock.clone(), config.clone()));
    let verifier = Arc::new(CommandVerificationHook::new(verify_command, verify_args, Duration::from_secs(120)));
    ProjectController::new(store, bus, agents, verifier, clock, config.clone())
}
