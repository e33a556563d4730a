//! Node reconciliation (§4.8 step 2): computes `Δ = manifest_nodes ⊖
//! filesystem_nodes` and applies it. Additions install from cache or
//! upstream; removals delete the stray directory; every other declared node
//! gets an idempotent update call so version drift self-heals. A per-node
//! failure is recorded but doesn't stop the pass; the whole step only fails
//! if every attempted mutation failed.

use std::collections::HashSet;
use std::path::Path;

use comfygit_consts::DISABLED_SUFFIX;
use comfygit_manifest::{Manifest, NodeSource};
use comfygit_nodes::{
    update_node, ArchiveCache, InstallOptions, NodeAcquisitionSource, NodeIdentifier, NodeInstaller, NoopResolutionTester,
    PythonResolutionTester,
};

use crate::error::{ReconcileError, ReconcileResult};

#[derive(Debug, Clone, Default)]
pub struct NodeReconcileReport {
    pub installed: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
    pub failures: Vec<(String, String)>,
}

pub fn reconcile_nodes<A: NodeAcquisitionSource>(
    manifest: &mut Manifest,
    custom_nodes_dir: &Path,
    archive_cache: ArchiveCache,
    acquisition: &A,
    tester: &dyn PythonResolutionTester,
) -> ReconcileResult<NodeReconcileReport> {
    let mut report = NodeReconcileReport::default();
    let mut attempted = 0usize;

    let declared = manifest.list_nodes();
    let declared_dir_names: HashSet<String> = declared.values().map(|e| e.name.clone()).collect();
    let installer = NodeInstaller::new(custom_nodes_dir, archive_cache, acquisition);

    for (package_id, entry) in &declared {
        let dir = custom_nodes_dir.join(&entry.name);
        if !dir.exists() {
            attempted += 1;
            let identifier = match entry.source {
                NodeSource::Registry => NodeIdentifier::Registry(package_id.clone()),
                NodeSource::Git => NodeIdentifier::Git {
                    url: entry.repository.clone().unwrap_or_default(),
                    reference: entry.version.clone(),
                },
                NodeSource::Development => NodeIdentifier::Development(entry.name.clone()),
            };
            let options = InstallOptions { dev: entry.source == NodeSource::Development, force: false, no_test: true, target_version: entry.version.clone() };
            match installer.install(manifest, &identifier, package_id, &options, &NoopResolutionTester) {
                Ok(_) => report.installed.push(package_id.clone()),
                Err(err) => {
                    tracing::warn!(package_id, error = %err, "node install during reconciliation failed");
                    report.failures.push((package_id.clone(), err.to_string()));
                }
            }
        } else if entry.source != NodeSource::Development {
            attempted += 1;
            match update_node(manifest, custom_nodes_dir, &installer.archive_cache, package_id, acquisition, entry.version.as_deref(), tester) {
                Ok(outcome) if outcome.new_version != outcome.previous_version => report.updated.push(package_id.clone()),
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(package_id, error = %err, "node update during reconciliation failed");
                    report.failures.push((package_id.clone(), err.to_string()));
                }
            }
        }
    }

    for entry in fs_err::read_dir(custom_nodes_dir)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(DISABLED_SUFFIX) {
            continue;
        }
        if !declared_dir_names.contains(&name) {
            attempted += 1;
            match fs_err::remove_dir_all(entry.path()) {
                Ok(()) => report.removed.push(name),
                Err(err) => {
                    tracing::warn!(dir = name, error = %err, "stray node directory removal failed");
                    report.failures.push((name, err.to_string()));
                }
            }
        }
    }

    if attempted > 0 && report.failures.len() == attempted {
        return Err(ReconcileError::AllNodeMutationsFailed);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use comfygit_external::ResolvedRef;
    use comfygit_manifest::{Manifest, NodeEntry};
    use comfygit_nodes::NodeError;

    struct NoSource;

    impl NodeAcquisitionSource for NoSource {
        fn resolve_ref(&self, _repo_url: &str, _reference: Option<&str>) -> comfygit_nodes::NodeResult<ResolvedRef> {
            Err(NodeError::NotInstalled { package_id: "unreachable".to_string() })
        }

        fn registry_archive_url(&self, _package_id: &str, _reference: &str) -> comfygit_nodes::NodeResult<Option<String>> {
            Ok(None)
        }

        fn download_archive(&self, _url: &str, _dest: &std::path::Path) -> comfygit_nodes::NodeResult<()> {
            Err(NodeError::NotInstalled { package_id: "unreachable".to_string() })
        }
    }

    fn manifest_in(dir: &std::path::Path) -> Manifest {
        Manifest::new(dir.join("pyproject.toml"))
    }

    #[test]
    fn removes_a_stray_directory_not_declared_in_the_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let custom_nodes_dir = dir.path().join("custom_nodes");
        fs_err::create_dir_all(custom_nodes_dir.join("stray_node")).unwrap();

        let mut manifest = manifest_in(dir.path());
        let cache = ArchiveCache::new(dir.path().join("cache"));
        let report = reconcile_nodes(&mut manifest, &custom_nodes_dir, cache, &NoSource, &NoopResolutionTester).unwrap();

        assert_eq!(report.removed, vec!["stray_node".to_string()]);
        assert!(!custom_nodes_dir.join("stray_node").exists());
    }

    #[test]
    fn leaves_disabled_directories_alone() {
        let dir = tempfile::tempdir().unwrap();
        let custom_nodes_dir = dir.path().join("custom_nodes");
        fs_err::create_dir_all(custom_nodes_dir.join(format!("some_node{}", DISABLED_SUFFIX))).unwrap();

        let mut manifest = manifest_in(dir.path());
        let cache = ArchiveCache::new(dir.path().join("cache"));
        let report = reconcile_nodes(&mut manifest, &custom_nodes_dir, cache, &NoSource, &NoopResolutionTester).unwrap();

        assert!(report.removed.is_empty());
        assert!(custom_nodes_dir.join(format!("some_node{}", DISABLED_SUFFIX)).exists());
    }

    #[test]
    fn a_present_development_node_is_never_touched() {
        let dir = tempfile::tempdir().unwrap();
        let custom_nodes_dir = dir.path().join("custom_nodes");
        fs_err::create_dir_all(custom_nodes_dir.join("dev_node")).unwrap();

        let mut manifest = manifest_in(dir.path());
        manifest.set_node(
            "dev_node",
            &NodeEntry { name: "dev_node".to_string(), repository: None, version: None, source: NodeSource::Development },
        );

        let cache = ArchiveCache::new(dir.path().join("cache"));
        let report = reconcile_nodes(&mut manifest, &custom_nodes_dir, cache, &NoSource, &NoopResolutionTester).unwrap();

        assert!(report.installed.is_empty());
        assert!(report.updated.is_empty());
        assert!(report.removed.is_empty());
        assert!(report.failures.is_empty());
    }

    #[test]
    fn a_missing_node_install_failure_is_recorded_not_fatal_when_other_work_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let custom_nodes_dir = dir.path().join("custom_nodes");
        fs_err::create_dir_all(&custom_nodes_dir).unwrap();
        fs_err::create_dir_all(custom_nodes_dir.join("stray_node")).unwrap();

        let mut manifest = manifest_in(dir.path());
        manifest.set_node(
            "missing_pkg",
            &NodeEntry {
                name: "missing_node".to_string(),
                repository: Some("https://example.invalid/repo.git".to_string()),
                version: None,
                source: NodeSource::Git,
            },
        );

        let cache = ArchiveCache::new(dir.path().join("cache"));
        let report = reconcile_nodes(&mut manifest, &custom_nodes_dir, cache, &NoSource, &NoopResolutionTester).unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.removed, vec!["stray_node".to_string()]);
    }
}
