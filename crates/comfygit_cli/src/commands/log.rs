use clap::Parser;
use comfygit_git::GitSnapshotManager;

use crate::context::Context;
use crate::error::CliResult;

#[derive(Parser, Debug)]
pub struct Args {
    /// Environment to inspect. Defaults to the active one.
    #[clap(long)]
    pub environment: Option<String>,

    /// Maximum number of entries to show.
    #[clap(long, default_value_t = 20)]
    pub limit: usize,
}

pub fn run(args: Args) -> CliResult<()> {
    let ctx = Context::discover()?;
    let env = ctx.environment(args.environment.as_deref())?;
    let snapshot = GitSnapshotManager::new(env.paths().cec_dir(), env.paths().comfyui_workflows_dir());
    for (tag, message) in snapshot.log(args.limit)? {
        println!("{tag}  {message}");
    }
    Ok(())
}
