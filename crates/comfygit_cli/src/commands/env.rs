use clap::Subcommand;

use crate::context::Context;
use crate::error::CliResult;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new environment inside the workspace.
    New { name: String },
    /// List every environment and mark the active one.
    List,
    /// Switch the active environment.
    Use { name: String },
}

pub fn run(command: Command) -> CliResult<()> {
    let ctx = Context::discover()?;
    match command {
        Command::New { name } => {
            ctx.workspace.create_environment(&name)?;
            println!("created environment `{name}`");
        }
        Command::List => {
            let active = ctx.workspace.active_environment_name();
            for name in ctx.workspace.list_environments()? {
                let marker = if active == Some(name.as_str()) { "*" } else { " " };
                println!("{marker} {name}");
            }
        }
        Command::Use { name } => {
            if !ctx.workspace.environment_exists(&name) {
                return Err(comfygit_workspace::CoreError::UnknownEnvironment { name }.into());
            }
            let mut workspace = ctx.workspace;
            workspace.set_active_environment(&name)?;
            println!("switched to `{name}`");
        }
    }
    Ok(())
}
