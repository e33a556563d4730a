use clap::Parser;
use comfygit_git::GitSnapshotManager;

use crate::context::Context;
use crate::error::CliResult;

#[derive(Parser, Debug)]
pub struct Args {
    /// Environment to roll back. Defaults to the active one.
    #[clap(long)]
    pub environment: Option<String>,

    /// Version tag, SHA, or `HEAD~k` to roll back to.
    pub target: String,
}

pub fn run(args: Args) -> CliResult<()> {
    let ctx = Context::discover()?;
    let env = ctx.environment(args.environment.as_deref())?;
    let snapshot = GitSnapshotManager::new(env.paths().cec_dir(), env.paths().comfyui_workflows_dir());
    let outcome = snapshot.rollback(&args.target)?;

    println!("rolled back to {} as {}", args.target, outcome.tag);
    if !outcome.deleted_paths.is_empty() {
        println!("removed {} path(s) not present at the target", outcome.deleted_paths.len());
    }
    println!("workflows: {} restored, {} removed", outcome.mirror.restored.len(), outcome.mirror.deleted.len());
    Ok(())
}
