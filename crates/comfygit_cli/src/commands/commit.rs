use clap::Parser;
use comfygit_git::GitSnapshotManager;
use comfygit_manifest::Manifest;
use comfygit_reconcile::{blocking_issue, track_workflows};

use crate::context::Context;
use crate::error::{CliError, CliResult};

#[derive(Parser, Debug)]
pub struct Args {
    /// Environment to commit. Defaults to the active one.
    #[clap(long)]
    pub environment: Option<String>,

    /// Commit message.
    pub message: String,

    /// Commit even if workflows have unresolved nodes or required models.
    #[clap(long)]
    pub allow_issues: bool,
}

pub fn run(args: Args) -> CliResult<()> {
    let ctx = Context::discover()?;
    let env = ctx.environment(args.environment.as_deref())?;
    let mut manifest = Manifest::load(env.paths().manifest_path())?;

    let registry = ctx.registry()?;
    track_workflows(
        &mut manifest,
        &env.paths().comfyui_workflows_dir(),
        &env.paths().workflows_mirror_dir(),
        &ctx.model_index,
        &registry,
    )?;
    manifest.save()?;

    if let Some((workflow, reason)) = blocking_issue(&manifest) {
        if !args.allow_issues {
            return Err(CliError::Usage(format!(
                "workflow `{workflow}` {reason}; pass --allow-issues to commit anyway"
            )));
        }
    }

    let snapshot = GitSnapshotManager::new(env.paths().cec_dir(), env.paths().comfyui_workflows_dir());
    let tag = snapshot.commit(&args.message)?;
    println!("committed {tag}");
    Ok(())
}
