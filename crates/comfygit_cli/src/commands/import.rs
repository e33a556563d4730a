use std::path::PathBuf;

use clap::Parser;
use comfygit_importexport::{import, ImportOptions, ImportSource};

use crate::commands::sync::ModelsArg;
use crate::context::Context;
use crate::error::{CliError, CliResult};

#[derive(Parser, Debug)]
pub struct Args {
    /// Name for the new environment.
    pub environment: String,

    /// Import from a local archive produced by `export`.
    #[clap(long, conflicts_with = "git")]
    pub archive: Option<PathBuf>,

    /// Import from a git URL carrying its own `.cec/.git` history.
    #[clap(long, conflicts_with = "archive")]
    pub git: Option<String>,

    /// Reinstall the PyTorch backend under this label (e.g. `cu121`, `cpu`).
    #[clap(long)]
    pub torch_backend: Option<String>,

    /// Model acquisition strategy to apply after restoring the environment.
    #[clap(long, value_enum, default_value = "required")]
    pub models: ModelsArg,
}

pub fn run(args: Args) -> CliResult<()> {
    let ctx = Context::discover()?;
    let source = match (&args.archive, &args.git) {
        (Some(path), None) => ImportSource::Archive(path),
        (None, Some(url)) => ImportSource::GitUrl(url),
        _ => return Err(CliError::Usage("pass exactly one of --archive or --git".to_string())),
    };

    let acquisition = ctx.acquisition()?;
    let broker_paths = ctx.workspace.paths().environment_dir(&args.environment);
    let broker = comfygit_python::PythonBroker::new(broker_paths);
    let tester = ctx.tester();
    let downloader = ctx.downloader()?;
    let options = ImportOptions { torch_backend: args.torch_backend.clone(), model_strategy: args.models.into() };

    let report = import(
        source,
        &ctx.workspace,
        &args.environment,
        &acquisition,
        ctx.archive_cache(),
        &broker,
        &tester,
        &ctx.model_index,
        &downloader,
        &options,
    )?;

    println!(
        "imported `{}`: {} node(s) installed, {} model(s) downloaded",
        args.environment,
        report.nodes.installed.len(),
        report.models.downloaded.len()
    );
    Ok(())
}
