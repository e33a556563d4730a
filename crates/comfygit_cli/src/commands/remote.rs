use clap::Subcommand;
use comfygit_git::GitSnapshotManager;

use crate::context::Context;
use crate::error::CliResult;

#[derive(Subcommand, Debug)]
pub enum Command {
    Add {
        #[clap(long)]
        environment: Option<String>,
        name: String,
        url: String,
    },
    Remove {
        #[clap(long)]
        environment: Option<String>,
        name: String,
    },
    List {
        #[clap(long)]
        environment: Option<String>,
    },
}

pub fn run(command: Command) -> CliResult<()> {
    let ctx = Context::discover()?;
    match command {
        Command::Add { environment, name, url } => {
            let env = ctx.environment(environment.as_deref())?;
            let snapshot = GitSnapshotManager::new(env.paths().cec_dir(), env.paths().comfyui_workflows_dir());
            snapshot.remote_add(&name, &url)?;
            println!("added remote `{name}` -> {url}");
        }
        Command::Remove { environment, name } => {
            let env = ctx.environment(environment.as_deref())?;
            let snapshot = GitSnapshotManager::new(env.paths().cec_dir(), env.paths().comfyui_workflows_dir());
            snapshot.remote_remove(&name)?;
            println!("removed remote `{name}`");
        }
        Command::List { environment } => {
            let env = ctx.environment(environment.as_deref())?;
            let snapshot = GitSnapshotManager::new(env.paths().cec_dir(), env.paths().comfyui_workflows_dir());
            for (name, url) in snapshot.remote_list()? {
                println!("{name}  {url}");
            }
        }
    }
    Ok(())
}
