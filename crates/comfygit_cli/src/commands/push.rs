use clap::Parser;
use comfygit_git::GitSnapshotManager;

use crate::context::Context;
use crate::error::CliResult;

#[derive(Parser, Debug)]
pub struct Args {
    /// Environment to push. Defaults to the active one.
    #[clap(long)]
    pub environment: Option<String>,

    /// Remote name.
    #[clap(default_value = "origin")]
    pub remote: String,

    /// Force-with-lease semantics.
    #[clap(long)]
    pub force: bool,
}

pub fn run(args: Args) -> CliResult<()> {
    let ctx = Context::discover()?;
    let env = ctx.environment(args.environment.as_deref())?;
    let snapshot = GitSnapshotManager::new(env.paths().cec_dir(), env.paths().comfyui_workflows_dir());
    snapshot.push(&args.remote, args.force)?;
    println!("pushed to {}", args.remote);
    Ok(())
}
