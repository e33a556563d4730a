use clap::Parser;
use comfygit_git::GitSnapshotManager;
use comfygit_manifest::Manifest;
use comfygit_reconcile::reconcile;

use crate::commands::sync::ModelsArg;
use crate::context::Context;
use crate::error::CliResult;

#[derive(Parser, Debug)]
pub struct Args {
    /// Environment to pull into. Defaults to the active one.
    #[clap(long)]
    pub environment: Option<String>,

    /// Remote name.
    #[clap(default_value = "origin")]
    pub remote: String,

    /// Discard uncommitted changes instead of refusing to pull.
    #[clap(long)]
    pub force: bool,

    /// Model acquisition strategy to run as the pipeline's last step.
    #[clap(long, value_enum, default_value = "required")]
    pub models: ModelsArg,
}

pub fn run(args: Args) -> CliResult<()> {
    let ctx = Context::discover()?;
    let env = ctx.environment(args.environment.as_deref())?;
    let snapshot = GitSnapshotManager::new(env.paths().cec_dir(), env.paths().comfyui_workflows_dir());

    let outcome = snapshot.pull(&args.remote, args.force)?;

    let models_pool_dir = ctx.workspace.paths().default_models_pool();
    let acquisition = ctx.acquisition()?;
    let broker = ctx.broker(&env);
    let tester = ctx.tester();
    let downloader = ctx.downloader()?;
    let registry = ctx.registry()?;

    let mut manifest = Manifest::load(env.paths().manifest_path())?;
    let reconciled = reconcile(
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
    );

    match reconciled {
        Ok(report) => {
            manifest.save()?;
            snapshot.commit(&format!("Pull from {}", args.remote))?;
            println!(
                "pulled {} -> {} ({} node change(s), {} workflow(s) tracked, {} restored)",
                outcome.previous_head,
                outcome.new_head,
                report.nodes.installed.len() + report.nodes.updated.len() + report.nodes.removed.len(),
                report.workflows_tracked.len(),
                report.workflows.restored.len()
            );
            Ok(())
        }
        Err(err) => {
            snapshot.revert_to(&outcome.previous_head)?;
            Err(err.into())
        }
    }
}
