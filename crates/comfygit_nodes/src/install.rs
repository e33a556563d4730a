//! The install pipeline (§4.5): resolve identifier, detect conflicts,
//! acquire into the archive cache, scan requirements, update the manifest,
//! then ask the Python broker to dry-run the new group.

use std::path::{Path, PathBuf};

use comfygit_consts::node_group_name;
use comfygit_manifest::{Manifest, NodeEntry, NodeSource};

use crate::acquisition::NodeAcquisitionSource;
use crate::archive_cache::ArchiveCache;
use crate::conflict::{detect_conflict, NodeDirectoryConflict};
use crate::error::{NodeError, NodeResult};
use crate::git_ops;
use crate::identifier::NodeIdentifier;
use crate::requirements::scan_requirements_file;

#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    pub dev: bool,
    pub force: bool,
    pub no_test: bool,
    /// Explicit version/ref for a registry package; defaults to `latest`.
    pub target_version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub package_id: String,
    pub directory_name: String,
    pub source: NodeSource,
    pub version: Option<String>,
    pub requirements: Vec<String>,
    pub resolution_tested: bool,
}

/// Dry-runs a prospective dependency group addition (§4.6 `test_resolution`).
/// A real implementation lives in `comfygit_python`; resolution here is
/// consumed through this trait to keep the package manager's dependency
/// graph from reaching into the broker's subprocess machinery.
pub trait PythonResolutionTester {
    fn test_resolution(&self, group: &str, requirements: &[String]) -> NodeResult<()>;
}

pub struct NoopResolutionTester;
impl PythonResolutionTester for NoopResolutionTester {
    fn test_resolution(&self, _group: &str, _requirements: &[String]) -> NodeResult<()> {
        Ok(())
    }
}

pub struct NodeInstaller<'a, A: NodeAcquisitionSource> {
    pub custom_nodes_dir: &'a Path,
    pub archive_cache: ArchiveCache,
    pub acquisition: A,
}

impl<'a, A: NodeAcquisitionSource> NodeInstaller<'a, A> {
    pub fn new(custom_nodes_dir: &'a Path, archive_cache: ArchiveCache, acquisition: A) -> Self {
        Self { custom_nodes_dir, archive_cache, acquisition }
    }

    pub fn install(
        &self,
        manifest: &mut Manifest,
        identifier: &NodeIdentifier,
        package_id: &str,
        options: &InstallOptions,
        tester: &dyn PythonResolutionTester,
    ) -> NodeResult<InstallOutcome> {
        let (dir_name, repo_url) = match identifier {
            NodeIdentifier::Registry(id) => (id.clone(), None),
            NodeIdentifier::Git { url, .. } => (directory_name_from_url(url), Some(url.clone())),
            NodeIdentifier::Development(name) => (name.clone(), None),
        };
        let dest = self.custom_nodes_dir.join(&dir_name);

        self.clear_disabled_sibling(&dest)?;

        if !options.force {
            if let Some(conflict) = detect_conflict(&dest, repo_url.as_deref())? {
                match (conflict, options.dev) {
                    (NodeDirectoryConflict::SameRepo, true) => {}
                    _ => {
                        return Err(NodeError::Conflict { package_id: package_id.to_string(), path: dest, conflict });
                    }
                }
            }
        }

        let (source, version) = match identifier {
            NodeIdentifier::Development(_) => {
                if !dest.exists() {
                    return Err(NodeError::NotInstalled { package_id: package_id.to_string() });
                }
                (NodeSource::Development, None)
            }
            NodeIdentifier::Registry(id) => {
                let resolved_ref = options.target_version.clone().unwrap_or_else(|| "latest".to_string());
                let archive_url = self.acquisition.registry_archive_url(id, &resolved_ref)?;
                self.acquire_into(&dest, id, &resolved_ref, None, archive_url.as_deref())?;
                (NodeSource::Registry, Some(resolved_ref))
            }
            NodeIdentifier::Git { url, reference } => {
                let resolved = self.acquisition.resolve_ref(url, reference.as_deref())?;
                self.acquire_into(&dest, package_id, &resolved.sha, Some(url), resolved.archive_url.as_deref())?;
                (NodeSource::Git, Some(resolved.sha))
            }
        };

        let requirements = scan_requirements_file(&dest)?.unwrap_or_default();
        let group = node_group_name(package_id);
        if !requirements.is_empty() {
            manifest.add_dependencies_from_list(&group, &requirements);
        }

        manifest.set_node(
            package_id,
            &NodeEntry {
                name: dir_name.clone(),
                repository: repo_url,
                version: version.clone(),
                source,
            },
        );

        let resolution_tested = if options.no_test {
            false
        } else {
            tester.test_resolution(&group, &requirements)?;
            true
        };

        Ok(InstallOutcome {
            package_id: package_id.to_string(),
            directory_name: dir_name,
            source,
            version,
            requirements,
            resolution_tested,
        })
    }

    fn clear_disabled_sibling(&self, dest: &Path) -> NodeResult<()> {
        let disabled = PathBuf::from(format!("{}{}", dest.display(), comfygit_consts::DISABLED_SUFFIX));
        if disabled.exists() {
            fs_err::remove_dir_all(&disabled)?;
        }
        Ok(())
    }

    fn acquire_into(
        &self,
        dest: &Path,
        package_id: &str,
        reference: &str,
        git_url: Option<&str>,
        archive_url: Option<&str>,
    ) -> NodeResult<()> {
        if let Some(cached) = self.archive_cache.lookup(package_id, reference) {
            self.archive_cache.copy_into(&cached, dest)?;
            return Ok(());
        }

        if let Some(archive_url) = archive_url {
            let archive_path = dest.with_extension("archive.tmp");
            self.acquisition.download_archive(archive_url, &archive_path)?;
            let cached = self.archive_cache.store_archive(package_id, reference, &archive_path)?;
            fs_err::remove_file(&archive_path).ok();
            self.archive_cache.copy_into(&cached, dest)?;
            return Ok(());
        }

        if let Some(url) = git_url {
            git_ops::shallow_clone(url, Some(reference), dest)?;
            return Ok(());
        }

        Err(NodeError::NoAcquisitionSource { package_id: package_id.to_string(), reference: reference.to_string() })
    }
}

fn directory_name_from_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/').trim_end_matches(".git");
    trimmed.rsplit('/').next().unwrap_or(trimmed).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_name_strips_git_suffix() {
        assert_eq!(directory_name_from_url("https://github.com/ltdrdata/ComfyUI-Impact-Pack.git"), "ComfyUI-Impact-Pack");
    }
}
