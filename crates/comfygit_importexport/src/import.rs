//! Import (§4.10): the 9-step flow that turns a portable archive (or a
//! git-hosted environment) into a new, fully reconciled local environment.

use std::path::Path;

use comfygit_consts::COMFYUI_REPO_URL;
use comfygit_external::DownloadSource;
use comfygit_git::{git_ops, GitSnapshotManager};
use comfygit_manifest::Manifest;
use comfygit_model_index::ModelIndex;
use comfygit_nodes::{ArchiveCache, NodeAcquisitionSource, PythonResolutionTester};
use comfygit_python::{reinstall_torch, PythonBroker};
use comfygit_reconcile::{acquire_models, reconcile_nodes, BlockingDownloader, ModelAcquisitionReport, ModelAcquisitionStrategy, NodeReconcileReport};
use comfygit_workflow::mirror_workflows;
use comfygit_workspace::{EnvironmentPaths, ModelLink, Workspace, WorkspacePaths};

use crate::archive::{copy_dir_all, extract_gzip_tar};
use crate::error::ImportExportResult;

/// Where the archive comes from: a tarball produced by `export`, or a
/// git remote carrying its own `.cec/.git` history.
pub enum ImportSource<'a> {
    Archive(&'a Path),
    GitUrl(&'a str),
}

pub struct ImportOptions {
    pub torch_backend: Option<String>,
    pub model_strategy: ModelAcquisitionStrategy,
}

#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub nodes: NodeReconcileReport,
    pub models: ModelAcquisitionReport,
}

#[allow(clippy::too_many_arguments)]
pub fn import<A: NodeAcquisitionSource, D: DownloadSource>(
    source: ImportSource<'_>,
    workspace: &Workspace,
    environment_name: &str,
    acquisition: &A,
    archive_cache: ArchiveCache,
    broker: &PythonBroker,
    tester: &dyn PythonResolutionTester,
    model_index: &ModelIndex,
    downloader: &BlockingDownloader<D>,
    options: &ImportOptions,
) -> ImportExportResult<ImportReport> {
    let environment = workspace.create_environment(environment_name)?;
    let env_paths = environment.paths().clone();

    match source {
        ImportSource::Archive(archive_path) => {
            let scratch = tempfile::tempdir()?;
            extract_gzip_tar(archive_path, scratch.path())?;
            materialize_archive_contents(scratch.path(), &env_paths)?;
        }
        ImportSource::GitUrl(url) => {
            git_ops::clone(url, &env_paths.cec_dir(), None)?;
        }
    }

    let mut manifest = Manifest::load(env_paths.manifest_path())?;

    checkout_comfyui(workspace.paths(), &manifest, &env_paths)?;

    let python_version = fs_err::read_to_string(env_paths.python_version_file()).ok();
    broker.ensure(python_version.as_deref().map(str::trim))?;

    if let Some(backend) = &options.torch_backend {
        reinstall_torch(broker, &mut manifest, backend)?;
    }
    broker.sync()?;

    link_development_nodes(&manifest, &env_paths)?;
    let nodes = reconcile_nodes(&mut manifest, &env_paths.custom_nodes_dir(), archive_cache, acquisition, tester)?;

    mirror_workflows(&env_paths.workflows_mirror_dir(), &env_paths.comfyui_workflows_dir())?;

    let models = acquire_models(&mut manifest, &workspace.paths().default_models_pool(), model_index, downloader, options.model_strategy)?;

    manifest.save()?;

    let snapshot = GitSnapshotManager::new(env_paths.cec_dir(), env_paths.comfyui_workflows_dir());
    snapshot.init()?;
    snapshot.commit("Initial import")?;

    Ok(ImportReport { nodes, models })
}

/// Copies the extracted tarball's files into their `.cec/` homes. A
/// git-URL import skips this entirely: the clone already put everything in
/// place.
fn materialize_archive_contents(scratch: &Path, env_paths: &EnvironmentPaths) -> ImportExportResult<()> {
    let manifest_src = scratch.join("pyproject.toml");
    if manifest_src.exists() {
        fs_err::copy(&manifest_src, env_paths.manifest_path())?;
    }
    let lockfile_src = scratch.join("uv.lock");
    if lockfile_src.exists() {
        fs_err::copy(&lockfile_src, env_paths.lockfile_path())?;
    }
    let python_version_src = scratch.join(".python-version");
    if python_version_src.exists() {
        fs_err::copy(&python_version_src, env_paths.python_version_file())?;
    }
    let workflows_src = scratch.join("workflows");
    if workflows_src.exists() {
        copy_dir_all(&workflows_src, &env_paths.workflows_mirror_dir())?;
    }
    let dev_nodes_src = scratch.join("dev_nodes");
    if dev_nodes_src.exists() {
        copy_dir_all(&dev_nodes_src, &env_paths.dev_nodes_dir())?;
    }
    Ok(())
}

/// Populates `ComfyUI/` from the workspace's clone cache, cloning into the
/// cache first if this ref hasn't been seen before.
fn checkout_comfyui(workspace_paths: &WorkspacePaths, manifest: &Manifest, env_paths: &EnvironmentPaths) -> ImportExportResult<()> {
    let comfyui_ref = manifest.environment_config().comfyui_ref.unwrap_or_else(|| "master".to_string());
    let cache_entry = workspace_paths.comfyui_cache_entry(&comfyui_ref);
    if !cache_entry.exists() {
        git_ops::clone(COMFYUI_REPO_URL, &cache_entry, Some(&comfyui_ref))?;
    }
    copy_dir_all(&cache_entry, &env_paths.comfyui_dir())?;
    Ok(())
}

/// Symlinks every manifest-declared development node's `custom_nodes/`
/// entry to its `.cec/dev_nodes/` source, reusing the same platform symlink
/// primitive the model pool link uses (§4.9) rather than a second one.
fn link_development_nodes(manifest: &Manifest, env_paths: &EnvironmentPaths) -> ImportExportResult<()> {
    for entry in manifest.list_nodes().into_values() {
        if entry.source != comfygit_manifest::NodeSource::Development {
            continue;
        }
        let source = env_paths.dev_node_source(&entry.name);
        if !source.exists() {
            continue;
        }
        let link = env_paths.custom_nodes_dir().join(&entry.name);
        ModelLink::new(link, source).create()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use comfygit_manifest::{NodeEntry, NodeSource};
    use comfygit_workspace::Workspace;

    fn new_environment() -> (tempfile::TempDir, EnvironmentPaths) {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::create(dir.path().join("workspace")).unwrap();
        let env = workspace.create_environment("default").unwrap();
        (dir, env.paths().clone())
    }

    #[test]
    fn materialize_copies_present_files_and_skips_absent_ones() {
        let (_dir, env_paths) = new_environment();
        let scratch = tempfile::tempdir().unwrap();
        fs_err::write(scratch.path().join("pyproject.toml"), "[project]\nname=\"x\"\n").unwrap();
        fs_err::create_dir_all(scratch.path().join("workflows")).unwrap();
        fs_err::write(scratch.path().join("workflows/wf.json"), "{}").unwrap();

        materialize_archive_contents(scratch.path(), &env_paths).unwrap();

        assert!(env_paths.manifest_path().exists());
        assert!(env_paths.workflows_mirror_dir().join("wf.json").exists());
        assert!(!env_paths.lockfile_path().exists());
    }

    #[test]
    fn link_development_nodes_symlinks_only_entries_with_a_source_dir() {
        let (_dir, env_paths) = new_environment();
        let mut manifest = Manifest::new(env_paths.manifest_path());
        manifest.set_node(
            "dev_pkg",
            &NodeEntry { name: "dev_node".to_string(), repository: None, version: None, source: NodeSource::Development },
        );
        manifest.set_node(
            "missing_pkg",
            &NodeEntry { name: "missing_dev_node".to_string(), repository: None, version: None, source: NodeSource::Development },
        );
        fs_err::create_dir_all(env_paths.dev_node_source("dev_node")).unwrap();

        link_development_nodes(&manifest, &env_paths).unwrap();

        assert!(env_paths.custom_nodes_dir().join("dev_node").exists());
        assert!(!env_paths.custom_nodes_dir().join("missing_dev_node").exists());
    }
}

