//! # ComfyGit CLI
//!
//! The binary entry point: parses arguments, sets up logging, resolves the
//! workspace, and dispatches to the relevant core crate operation. The
//! command tree mirrors pixi's own `Cli`/subcommand split, but the argument
//! surface here is plumbing, not a contract — it exists so every core
//! operation is reachable, not to be a polished UX.

#![deny(clippy::dbg_macro)]

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

pub mod commands;
pub mod context;
pub mod error;

use error::CliResult;

#[derive(Parser, Debug)]
#[command(name = "comfygit", version, about = "Environment reconciliation for ComfyUI workspaces")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Increase logging verbosity (-v, -vv, -vvv).
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all but error-level logging.
    #[clap(short, long, global = true)]
    pub quiet: bool,
}

impl Args {
    fn log_level_filter(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::OFF;
        }
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new workspace at the resolved root.
    Init(commands::init::Args),
    /// Manage environments inside the workspace.
    #[command(subcommand)]
    Env(commands::env::Command),
    /// Show whether the active environment is safe to commit.
    Status(commands::status::Args),
    /// Run the reconciliation pipeline without a git commit.
    Sync(commands::sync::Args),
    /// Commit the current `.cec/` state as a new version.
    Commit(commands::commit::Args),
    /// Roll the environment back to an earlier version.
    Rollback(commands::rollback::Args),
    /// Push `.cec/` history to a remote.
    Push(commands::push::Args),
    /// Pull `.cec/` history from a remote and reconcile.
    Pull(commands::pull::Args),
    /// List committed versions.
    Log(commands::log::Args),
    /// Manage `.cec/` git remotes.
    #[command(subcommand)]
    Remote(commands::remote::Command),
    /// Package a committed environment into a portable archive.
    Export(commands::export::Args),
    /// Restore an environment from a portable archive or git URL.
    Import(commands::import::Args),
}

pub fn execute() -> CliResult<()> {
    let args = Args::parse();
    setup_logging(args.log_level_filter());

    match args.command {
        Command::Init(a) => commands::init::run(a),
        Command::Env(c) => commands::env::run(c),
        Command::Status(a) => commands::status::run(a),
        Command::Sync(a) => commands::sync::run(a),
        Command::Commit(a) => commands::commit::run(a),
        Command::Rollback(a) => commands::rollback::run(a),
        Command::Push(a) => commands::push::run(a),
        Command::Pull(a) => commands::pull::run(a),
        Command::Log(a) => commands::log::run(a),
        Command::Remote(c) => commands::remote::run(c),
        Command::Export(a) => commands::export::run(a),
        Command::Import(a) => commands::import::run(a),
    }
}

fn setup_logging(level_filter: LevelFilter) {
    use tracing_subscriber::{EnvFilter, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .from_env_lossy();

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(level_filter >= LevelFilter::INFO).without_time();

    let _ = tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init();
}
