//! Shells out to the system `git` for cloning, pulling, and remote
//! inspection. Grounded on pixi's own `pixi_git` crate, which resolves the
//! `git` binary once via `which` and drives it with `std::process::Command`
//! rather than linking libgit2.

use std::path::Path;
use std::process::Command;

use once_cell::sync::Lazy;

use crate::error::{NodeError, NodeResult};

static GIT: Lazy<Result<std::path::PathBuf, which::Error>> = Lazy::new(|| which::which("git"));

fn git_binary() -> NodeResult<&'static Path> {
    GIT.as_ref().map(|p| p.as_path()).map_err(|_| NodeError::GitNotFound)
}

fn run(args: &[&str], cwd: Option<&Path>) -> NodeResult<String> {
    let git = git_binary()?;
    let mut cmd = Command::new(git);
    cmd.args(args);
    if let Some(cwd) = cwd {
        cmd.current_dir(cwd);
    }
    let output = cmd.output()?;
    if !output.status.success() {
        return Err(NodeError::GitCommand {
            command: format!("git {}", args.join(" ")),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// `None` if `dir` isn't a git working tree, or has no `origin` remote.
pub fn remote_url(dir: &Path) -> NodeResult<Option<String>> {
    if !dir.join(".git").exists() {
        return Ok(None);
    }
    match run(&["remote", "get-url", "origin"], Some(dir)) {
        Ok(url) if !url.is_empty() => Ok(Some(url)),
        Ok(_) => Ok(None),
        Err(NodeError::GitCommand { .. }) => Ok(None),
        Err(other) => Err(other),
    }
}

/// Shallow clone of `url` at `reference` (branch, tag, or commit-ish) into
/// `dest`. `dest`'s parent must already exist; `dest` itself must not.
pub fn shallow_clone(url: &str, reference: Option<&str>, dest: &Path) -> NodeResult<()> {
    let mut args = vec!["clone", "--depth", "1"];
    if let Some(reference) = reference {
        args.push("--branch");
        args.push(reference);
    }
    let dest_str = dest.to_string_lossy().to_string();
    args.push(url);
    args.push(&dest_str);
    run(&args, None)?;
    Ok(())
}

/// Fast-forward-only pull, used by the node updater (§4.5 Update).
pub fn pull_ff_only(dir: &Path) -> NodeResult<()> {
    run(&["pull", "--ff-only"], Some(dir))?;
    Ok(())
}

/// The currently checked out commit SHA, used to record `version` after clone/pull.
pub fn head_sha(dir: &Path) -> NodeResult<String> {
    run(&["rev-parse", "HEAD"], Some(dir))
}
