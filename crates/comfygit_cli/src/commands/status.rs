use clap::Parser;
use comfygit_manifest::Manifest;
use comfygit_reconcile::{blocking_issue, track_workflows};

use crate::context::Context;
use crate::error::CliResult;

#[derive(Parser, Debug)]
pub struct Args {
    /// Environment to inspect. Defaults to the active one.
    #[clap(long)]
    pub environment: Option<String>,
}

pub fn run(args: Args) -> CliResult<()> {
    let ctx = Context::discover()?;
    let env = ctx.environment(args.environment.as_deref())?;
    let mut manifest = Manifest::load(env.paths().manifest_path())?;

    let registry = ctx.registry()?;
    let tracked = track_workflows(
        &mut manifest,
        &env.paths().comfyui_workflows_dir(),
        &env.paths().workflows_mirror_dir(),
        &ctx.model_index,
        &registry,
    )?;
    manifest.save()?;

    if !tracked.is_empty() {
        println!("tracked: {}", tracked.join(", "));
    }
    match blocking_issue(&manifest) {
        None => println!("clean: safe to commit"),
        Some((workflow, reason)) => println!("blocked: workflow `{workflow}` {reason}"),
    }
    Ok(())
}
