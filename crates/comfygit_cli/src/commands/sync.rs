use clap::Parser;
use comfygit_manifest::Manifest;
use comfygit_reconcile::{reconcile, ModelAcquisitionStrategy};

use crate::context::Context;
use crate::error::CliResult;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ModelsArg {
    All,
    Required,
    Skip,
}

impl From<ModelsArg> for ModelAcquisitionStrategy {
    fn from(value: ModelsArg) -> Self {
        match value {
            ModelsArg::All => ModelAcquisitionStrategy::All,
            ModelsArg::Required => ModelAcquisitionStrategy::Required,
            ModelsArg::Skip => ModelAcquisitionStrategy::Skip,
        }
    }
}

#[derive(Parser, Debug)]
pub struct Args {
    /// Environment to reconcile. Defaults to the active one.
    #[clap(long)]
    pub environment: Option<String>,

    /// Whether to also acquire unresolved models during this pass.
    #[clap(long, value_enum, default_value = "skip")]
    pub models: ModelsArg,
}

pub fn run(args: Args) -> CliResult<()> {
    let ctx = Context::discover()?;
    let env = ctx.environment(args.environment.as_deref())?;
    let mut manifest = Manifest::load(env.paths().manifest_path())?;
    let models_pool_dir = ctx.workspace.paths().default_models_pool();
    let acquisition = ctx.acquisition()?;
    let broker = ctx.broker(&env);
    let tester = ctx.tester();
    let downloader = ctx.downloader()?;
    let registry = ctx.registry()?;

    let report = reconcile(
        &mut manifest,
        env.paths(),
        &models_pool_dir,
        &acquisition,
        ctx.archive_cache(),
        &broker,
        &tester,
        &ctx.model_index,
        &downloader,
        &registry,
        args.models.into(),
    )?;
    manifest.save()?;

    println!(
        "nodes: {} installed, {} removed, {} updated, {} failed",
        report.nodes.installed.len(),
        report.nodes.removed.len(),
        report.nodes.updated.len(),
        report.nodes.failures.len()
    );
    println!(
        "workflows: {} tracked, {} restored, {} removed",
        report.workflows_tracked.len(),
        report.workflows.restored.len(),
        report.workflows.deleted.len()
    );
    if let Some(models) = report.models {
        println!("models: {} downloaded, {} failed", models.downloaded.len(), models.failed.len());
    }
    Ok(())
}
