use std::path::PathBuf;

use clap::Parser;
use comfygit_importexport::export;
use comfygit_manifest::Manifest;

use crate::context::Context;
use crate::error::CliResult;

#[derive(Parser, Debug)]
pub struct Args {
    /// Environment to export. Defaults to the active one.
    #[clap(long)]
    pub environment: Option<String>,

    /// Destination archive path.
    pub dest: PathBuf,

    /// Export even if some models have no recorded source URL.
    #[clap(long)]
    pub allow_issues: bool,
}

pub fn run(args: Args) -> CliResult<()> {
    let ctx = Context::discover()?;
    let env = ctx.environment(args.environment.as_deref())?;
    let manifest = Manifest::load(env.paths().manifest_path())?;
    let report = export(env.paths(), &manifest, &args.dest, args.allow_issues)?;

    println!("exported to {}", report.archive_path.display());
    if !report.models_missing_sources.is_empty() {
        println!("warning: {} model(s) have no recorded source URL and cannot be reacquired on import", report.models_missing_sources.len());
    }
    Ok(())
}
