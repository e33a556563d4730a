use std::path::PathBuf;

use clap::Parser;
use comfygit_workspace::paths::resolve_workspace_root;
use comfygit_workspace::{Workspace, DEFAULT_WORKSPACE_DIR_NAME, WORKSPACE_ENV_VAR};

use crate::error::{CliError, CliResult};

#[derive(Parser, Debug)]
pub struct Args {
    /// Workspace root. Defaults to `$COMFYGIT_HOME`, then `~/.comfygit`.
    #[clap(long)]
    pub path: Option<PathBuf>,
}

pub fn run(args: Args) -> CliResult<()> {
    let root = match args.path {
        Some(path) => path,
        None => resolve_workspace_root(WORKSPACE_ENV_VAR, DEFAULT_WORKSPACE_DIR_NAME)
            .ok_or_else(|| CliError::Usage("could not determine a home directory; pass --path".to_string()))?,
    };
    let workspace = Workspace::create(root)?;
    tracing::info!(root = %workspace.paths().root().display(), "workspace initialized");
    Ok(())
}
