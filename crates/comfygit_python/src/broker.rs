//! Keeps an environment's `.venv` coherent with its manifest by delegating
//! every resolution and install decision to `uv` (§4.6): this crate never
//! resolves dependencies itself, it only shells out and interprets output.

use std::collections::HashSet;
use std::path::PathBuf;

use comfygit_manifest::Manifest;
use serde::Deserialize;

use crate::error::{PythonError, PythonResult};
use crate::resolution::parse_resolution_error;
use crate::uv_ops::{self, UvOutput};

const VENV_MARKER: &str = "pyvenv.cfg";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
}

pub struct PythonBroker {
    environment_root: PathBuf,
}

impl PythonBroker {
    pub fn new(environment_root: impl Into<PathBuf>) -> Self {
        Self { environment_root: environment_root.into() }
    }

    pub fn project_dir(&self) -> PathBuf {
        self.environment_root.join(".cec")
    }

    pub fn venv_dir(&self) -> PathBuf {
        self.environment_root.join(".venv")
    }

    /// Creates the venv if missing. A no-op if one already exists; §4.6
    /// doesn't ask this to detect a Python-version mismatch against an
    /// existing venv, only to create one when absent.
    pub fn ensure(&self, python_version: Option<&str>) -> PythonResult<()> {
        if self.venv_dir().join(VENV_MARKER).exists() {
            return Ok(());
        }
        let mut args = vec!["venv"];
        if let Some(version) = python_version {
            args.push("--python");
            args.push(version);
        }
        uv_ops::run(&self.project_dir(), &self.venv_dir(), &args)?;
        Ok(())
    }

    fn require_venv(&self) -> PythonResult<()> {
        if self.venv_dir().join(VENV_MARKER).exists() {
            Ok(())
        } else {
            Err(PythonError::VenvMissing { path: self.venv_dir() })
        }
    }

    /// Installs/updates the venv to match the manifest and lockfile.
    pub fn sync(&self) -> PythonResult<()> {
        self.require_venv()?;
        uv_ops::run(&self.project_dir(), &self.venv_dir(), &["sync", "--all-extras"])?;
        Ok(())
    }

    /// Dry-runs a resolve of the current manifest (the caller has already
    /// applied the prospective group/requirement change before calling
    /// this), returning a structured conflict on failure instead of raising.
    pub fn test_resolution(&self, subject: &str) -> PythonResult<()> {
        self.require_venv()?;
        let (ok, output) = uv_ops::run_allow_failure(&self.project_dir(), &self.venv_dir(), &["sync", "--all-extras", "--dry-run"])?;
        if !ok {
            return Err(PythonError::Resolution(parse_resolution_error(subject, &output.stderr)));
        }
        Ok(())
    }

    pub fn add(&self, spec: &str, group: Option<&str>, bounds: Option<&str>) -> PythonResult<()> {
        self.require_venv()?;
        let full_spec = match bounds {
            Some(bounds) => format!("{spec}{bounds}"),
            None => spec.to_string(),
        };
        let mut args = vec!["add", full_spec.as_str()];
        if let Some(group) = group {
            args.push("--optional");
            args.push(group);
        }
        uv_ops::run(&self.project_dir(), &self.venv_dir(), &args)?;
        Ok(())
    }

    pub fn remove(&self, name: &str, group: Option<&str>) -> PythonResult<()> {
        self.require_venv()?;
        let mut args = vec!["remove", name];
        if let Some(group) = group {
            args.push("--optional");
            args.push(group);
        }
        uv_ops::run(&self.project_dir(), &self.venv_dir(), &args)?;
        Ok(())
    }

    /// Removal of an entire group is a manifest-only operation: `uv` has no
    /// "drop this extras group" verb, so the manifest store deletes the
    /// table and a subsequent `sync()` drops the now-unreferenced packages.
    pub fn remove_group(&self, manifest: &mut Manifest, group: &str) -> PythonResult<()> {
        manifest.remove_optional_group(group);
        Ok(())
    }

    /// `[tool.uv.constraint-dependencies]` is manifest state only; it never
    /// triggers an install by itself (§4.6 Constraints).
    pub fn constraint_add(&self, manifest: &mut Manifest, spec: &str) {
        manifest.set_constraint(spec);
    }

    pub fn constraint_remove(&self, manifest: &mut Manifest, name: &str) {
        manifest.remove_constraint(name);
    }

    pub fn constraint_list(&self, manifest: &Manifest) -> Vec<(String, String)> {
        manifest.list_constraints().into_iter().collect()
    }

    /// `main_only` restricts the listing to packages declared in
    /// `project.dependencies`; otherwise every package `uv` sees installed
    /// in the venv (including every optional group) is returned.
    pub fn list(&self, manifest: &Manifest, main_only: bool) -> PythonResult<Vec<InstalledPackage>> {
        let installed = self.installed_packages()?;
        if !main_only {
            return Ok(installed);
        }
        let declared: HashSet<String> = manifest.list_dependencies(None).iter().map(|r| package_name(r)).collect();
        Ok(installed.into_iter().filter(|p| declared.contains(&p.name.to_lowercase())).collect())
    }

    pub(crate) fn installed_packages(&self) -> PythonResult<Vec<InstalledPackage>> {
        self.require_venv()?;
        let output: UvOutput = uv_ops::run(&self.project_dir(), &self.venv_dir(), &["pip", "list", "--format", "json"])?;
        serde_json::from_str(&output.stdout)
            .map_err(|source| PythonError::UvOutput { command: "pip list".to_string(), source })
    }

    pub(crate) fn installed_version(&self, name: &str) -> PythonResult<Option<String>> {
        Ok(self.installed_packages()?.into_iter().find(|p| p.name.eq_ignore_ascii_case(name)).map(|p| p.version))
    }
}

fn package_name(requirement: &str) -> String {
    requirement
        .split(|c: char| "=<>!~; [".contains(c))
        .next()
        .unwrap_or(requirement)
        .trim()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn package_name_strips_version_specifier() {
        assert_eq!(package_name("numpy>=1.26,<2.0"), "numpy");
        assert_eq!(package_name("Torch==2.1.0"), "torch");
        assert_eq!(package_name("requests[socks]"), "requests");
    }

    #[test]
    fn venv_dir_sits_alongside_cec() {
        let broker = PythonBroker::new("/workspace/environments/default");
        assert_eq!(broker.project_dir(), Path::new("/workspace/environments/default/.cec"));
        assert_eq!(broker.venv_dir(), Path::new("/workspace/environments/default/.venv"));
    }

    #[test]
    fn sync_without_a_venv_reports_venv_missing() {
        let dir = tempfile::tempdir().unwrap();
        let broker = PythonBroker::new(dir.path().to_path_buf());
        let err = broker.sync().unwrap_err();
        assert!(matches!(err, PythonError::VenvMissing { .. }));
    }
}
