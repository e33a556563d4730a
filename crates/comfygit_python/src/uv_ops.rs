//! Shells out to the system `uv` binary the same way `comfygit_nodes::git_ops`
//! shells out to `git`: resolve the binary once via `which`, drive it with
//! `std::process::Command`, never link a resolver library directly.

use std::path::Path;
use std::process::Command;

use once_cell::sync::Lazy;

use crate::error::{PythonError, PythonResult};

static UV: Lazy<Result<std::path::PathBuf, which::Error>> = Lazy::new(|| which::which("uv"));

fn uv_binary() -> PythonResult<&'static Path> {
    UV.as_ref().map(|p| p.as_path()).map_err(|_| PythonError::UvNotFound)
}

pub struct UvOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs `uv` with `--project <project_dir>` and `UV_PROJECT_ENVIRONMENT`
/// pointed at `venv_dir`, so the venv lives at `<env>/.venv` alongside
/// `<env>/.cec` rather than inside the manifest's own directory.
pub fn run(project_dir: &Path, venv_dir: &Path, args: &[&str]) -> PythonResult<UvOutput> {
    let uv = uv_binary()?;
    tracing::debug!(?args, project = %project_dir.display(), "running uv");
    let mut cmd = Command::new(uv);
    cmd.arg("--project").arg(project_dir);
    cmd.env("UV_PROJECT_ENVIRONMENT", venv_dir);
    cmd.args(args);
    let output = cmd.output()?;
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    if !output.status.success() {
        return Err(PythonError::UvCommand { command: format!("uv {}", args.join(" ")), stderr });
    }
    Ok(UvOutput { stdout, stderr })
}

/// Like [`run`], but a non-zero exit is returned as `Ok` with the captured
/// output instead of an error, for callers that need to inspect stderr on
/// failure (dry-run resolution).
pub fn run_allow_failure(project_dir: &Path, venv_dir: &Path, args: &[&str]) -> PythonResult<(bool, UvOutput)> {
    let uv = uv_binary()?;
    let mut cmd = Command::new(uv);
    cmd.arg("--project").arg(project_dir);
    cmd.env("UV_PROJECT_ENVIRONMENT", venv_dir);
    cmd.args(args);
    let output = cmd.output()?;
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    Ok((output.status.success(), UvOutput { stdout, stderr }))
}
