//! Removal (§4.5 Removal): registry/git sources are deleted outright;
//! development sources are preserved on disk via a `.disabled` rename.

use std::path::Path;

use comfygit_consts::DISABLED_SUFFIX;
use comfygit_manifest::{Manifest, NodeSource};

use crate::error::{NodeError, NodeResult};

pub fn remove_node(manifest: &mut Manifest, custom_nodes_dir: &Path, package_id: &str) -> NodeResult<()> {
    let entry = manifest.get_node(package_id).ok_or_else(|| NodeError::NotInstalled { package_id: package_id.to_string() })?;
    let dir = custom_nodes_dir.join(&entry.name);

    match entry.source {
        NodeSource::Registry | NodeSource::Git => {
            if dir.exists() {
                fs_err::remove_dir_all(&dir)?;
            }
        }
        NodeSource::Development => {
            if dir.exists() {
                let disabled = disabled_path(&dir);
                if disabled.exists() {
                    fs_err::remove_dir_all(&disabled)?;
                }
                fs_err::rename(&dir, &disabled)?;
            }
        }
    }

    manifest.remove_node(package_id);
    Ok(())
}

fn disabled_path(dir: &Path) -> std::path::PathBuf {
    std::path::PathBuf::from(format!("{}{DISABLED_SUFFIX}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use comfygit_manifest::NodeEntry;

    fn manifest_with_node(dir: &Path, source: NodeSource) -> Manifest {
        let mut manifest = Manifest::new(dir.join("pyproject.toml"));
        manifest.set_node(
            "comfyui-impact-pack",
            &NodeEntry { name: "ImpactPack".into(), repository: None, version: None, source },
        );
        manifest
    }

    #[test]
    fn registry_source_deletes_directory_entirely() {
        let dir = tempfile::tempdir().unwrap();
        let custom_nodes = dir.path().join("custom_nodes");
        fs_err::create_dir_all(custom_nodes.join("ImpactPack")).unwrap();
        let mut manifest = manifest_with_node(dir.path(), NodeSource::Registry);

        remove_node(&mut manifest, &custom_nodes, "comfyui-impact-pack").unwrap();

        assert!(!custom_nodes.join("ImpactPack").exists());
        assert!(manifest.get_node("comfyui-impact-pack").is_none());
    }

    #[test]
    fn development_source_is_renamed_not_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let custom_nodes = dir.path().join("custom_nodes");
        fs_err::create_dir_all(custom_nodes.join("ImpactPack")).unwrap();
        fs_err::write(custom_nodes.join("ImpactPack/marker.py"), "x").unwrap();
        let mut manifest = manifest_with_node(dir.path(), NodeSource::Development);

        remove_node(&mut manifest, &custom_nodes, "comfyui-impact-pack").unwrap();

        assert!(!custom_nodes.join("ImpactPack").exists());
        assert!(custom_nodes.join("ImpactPack.disabled/marker.py").exists());
        assert!(manifest.get_node("comfyui-impact-pack").is_none());
    }
}
