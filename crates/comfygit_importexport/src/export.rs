//! Export (§4.10): a gzip tar of the manifest, lockfile, pinned Python
//! version, committed workflows, and development node sources. Fails
//! outright on uncommitted `.cec/` changes; models without a recorded
//! source URL only block the export when `allow_issues` is false.

use std::path::{Path, PathBuf};

use comfygit_git::GitSnapshotManager;
use comfygit_manifest::{Manifest, ModelCriticality};
use comfygit_workspace::EnvironmentPaths;

use crate::archive::{append_dir, append_file_if_present, write_gzip_tar};
use crate::error::{ImportExportError, ImportExportResult};

#[derive(Debug, Clone)]
pub struct ExportReport {
    pub archive_path: PathBuf,
    pub models_missing_sources: Vec<String>,
}

pub fn export(env_paths: &EnvironmentPaths, manifest: &Manifest, dest: &Path, allow_issues: bool) -> ImportExportResult<ExportReport> {
    let snapshot = GitSnapshotManager::new(env_paths.cec_dir(), env_paths.comfyui_workflows_dir());
    if snapshot.has_uncommitted_changes()? {
        return Err(ImportExportError::UncommittedChanges);
    }

    let missing: Vec<String> = [ModelCriticality::Required, ModelCriticality::Optional]
        .into_iter()
        .flat_map(|criticality| manifest.list_models(criticality).into_values())
        .filter(|record| record.sources.is_empty())
        .map(|record| record.filename)
        .collect();

    if !missing.is_empty() && !allow_issues {
        return Err(ImportExportError::MissingModelSources { count: missing.len(), names: missing });
    }

    write_gzip_tar(dest, |builder| {
        append_file_if_present(builder, &env_paths.manifest_path(), "pyproject.toml")?;
        append_file_if_present(builder, &env_paths.lockfile_path(), "uv.lock")?;
        append_file_if_present(builder, &env_paths.python_version_file(), ".python-version")?;
        append_dir(builder, &env_paths.workflows_mirror_dir(), "workflows")?;
        append_dir(builder, &env_paths.dev_nodes_dir(), "dev_nodes")?;
        Ok(())
    })?;

    Ok(ExportReport { archive_path: dest.to_path_buf(), models_missing_sources: missing })
}

#[cfg(test)]
mod tests {
    use super::*;
    use comfygit_workspace::Workspace;

    fn new_environment() -> (tempfile::TempDir, EnvironmentPaths) {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::create(dir.path().join("workspace")).unwrap();
        let env = workspace.create_environment("default").unwrap();
        let env_paths = env.paths().clone();
        GitSnapshotManager::new(env_paths.cec_dir(), env_paths.comfyui_workflows_dir()).init().unwrap();
        comfygit_git::git_ops::run(&env_paths.cec_dir(), &["config", "user.email", "test@example.com"]).unwrap();
        comfygit_git::git_ops::run(&env_paths.cec_dir(), &["config", "user.name", "Test"]).unwrap();
        (dir, env_paths)
    }

    #[test]
    fn export_fails_on_uncommitted_changes() {
        let (_dir, env_paths) = new_environment();
        let manifest = Manifest::new(env_paths.manifest_path());
        manifest.save().unwrap();

        let dest = env_paths.root().join("export.tar.gz");
        let err = export(&env_paths, &manifest, &dest, false).unwrap_err();
        assert!(matches!(err, ImportExportError::UncommittedChanges));
    }

    #[test]
    fn export_succeeds_once_committed() {
        let (_dir, env_paths) = new_environment();
        let manifest = Manifest::new(env_paths.manifest_path());
        manifest.save().unwrap();

        let snapshot = GitSnapshotManager::new(env_paths.cec_dir(), env_paths.comfyui_workflows_dir());
        snapshot.commit("initial").unwrap();

        let dest = env_paths.root().join("export.tar.gz");
        let report = export(&env_paths, &manifest, &dest, false).unwrap();
        assert!(report.archive_path.exists());
        assert!(report.models_missing_sources.is_empty());
    }
}
