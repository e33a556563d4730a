//! Update (§4.5 Update): registry/git sources refresh their content and
//! `version`; development sources only re-scan `requirements.txt` and diff
//! against the current group.

use std::path::Path;

use comfygit_consts::node_group_name;
use comfygit_manifest::{Manifest, NodeEntry, NodeSource};

use crate::acquisition::NodeAcquisitionSource;
use crate::archive_cache::ArchiveCache;
use crate::error::{NodeError, NodeResult};
use crate::git_ops;
use crate::install::PythonResolutionTester;
use crate::requirements::scan_requirements_file;

#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub package_id: String,
    pub previous_version: Option<String>,
    pub new_version: Option<String>,
    pub requirements: Vec<String>,
}

pub fn update_node<A: NodeAcquisitionSource>(
    manifest: &mut Manifest,
    custom_nodes_dir: &Path,
    archive_cache: &ArchiveCache,
    package_id: &str,
    acquisition: &A,
    reference: Option<&str>,
    tester: &dyn PythonResolutionTester,
) -> NodeResult<UpdateOutcome> {
    let mut entry = manifest.get_node(package_id).ok_or_else(|| NodeError::NotInstalled { package_id: package_id.to_string() })?;
    let dir = custom_nodes_dir.join(&entry.name);
    let previous_version = entry.version.clone();

    let new_version = match entry.source {
        NodeSource::Git => {
            git_ops::pull_ff_only(&dir)?;
            Some(git_ops::head_sha(&dir)?)
        }
        NodeSource::Registry => {
            let target_ref = reference.map(str::to_string).unwrap_or_else(|| "latest".to_string());
            match acquisition.registry_archive_url(package_id, &target_ref)? {
                Some(archive_url) => {
                    let archive_path = dir.with_extension("archive.tmp");
                    acquisition.download_archive(&archive_url, &archive_path)?;
                    let cached = archive_cache.store_archive(package_id, &target_ref, &archive_path)?;
                    fs_err::remove_file(&archive_path).ok();
                    archive_cache.copy_into(&cached, &dir)?;
                    Some(target_ref)
                }
                None => previous_version.clone(),
            }
        }
        NodeSource::Development => previous_version.clone(),
    };

    let requirements = scan_requirements_file(&dir)?.unwrap_or_default();
    let group = node_group_name(package_id);
    if !requirements.is_empty() {
        manifest.add_dependencies_from_list(&group, &requirements);
    }

    entry.version = new_version.clone();
    manifest.set_node(
        package_id,
        &NodeEntry { name: entry.name.clone(), repository: entry.repository.clone(), version: entry.version.clone(), source: entry.source },
    );

    tester.test_resolution(&group, &requirements)?;

    Ok(UpdateOutcome { package_id: package_id.to_string(), previous_version, new_version, requirements })
}

#[cfg(test)]
mod tests {
    use comfygit_external::ResolvedRef;

    use super::*;
    use crate::install::NoopResolutionTester;

    struct FakeAcquisition {
        archive_url: Option<String>,
    }

    impl NodeAcquisitionSource for FakeAcquisition {
        fn resolve_ref(&self, _repo_url: &str, _reference: Option<&str>) -> NodeResult<ResolvedRef> {
            unreachable!("registry update never calls resolve_ref")
        }

        fn registry_archive_url(&self, _package_id: &str, _reference: &str) -> NodeResult<Option<String>> {
            Ok(self.archive_url.clone())
        }

        fn download_archive(&self, _url: &str, dest: &Path) -> NodeResult<()> {
            fs_err::write(dest, b"fake-archive")?;
            Ok(())
        }
    }

    #[test]
    fn registry_source_without_new_archive_keeps_previous_version() {
        let tmp = tempfile::tempdir().unwrap();
        let custom_nodes_dir = tmp.path().join("custom_nodes");
        fs_err::create_dir_all(custom_nodes_dir.join("ImpactPack")).unwrap();

        let mut manifest = Manifest::new(tmp.path().join("comfygit.toml"));
        manifest.set_node(
            "comfyui-impact-pack",
            &NodeEntry { name: "ImpactPack".into(), repository: None, version: Some("1.0.0".into()), source: NodeSource::Registry },
        );

        let archive_cache = ArchiveCache::new(tmp.path().join("archive_cache"));
        let acquisition = FakeAcquisition { archive_url: None };
        let outcome = update_node(
            &mut manifest,
            &custom_nodes_dir,
            &archive_cache,
            "comfyui-impact-pack",
            &acquisition,
            None,
            &NoopResolutionTester,
        )
        .unwrap();

        assert_eq!(outcome.previous_version, Some("1.0.0".into()));
        assert_eq!(outcome.new_version, Some("1.0.0".into()));
    }
}
