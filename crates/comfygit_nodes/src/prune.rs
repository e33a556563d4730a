//! Prune (§4.5 Prune): remove installed nodes not referenced by any tracked
//! workflow, honoring a caller-supplied exclusion list.

use std::collections::HashSet;
use std::path::Path;

use comfygit_manifest::Manifest;

use crate::error::NodeResult;
use crate::remove::remove_node;

/// Package ids referenced by any workflow, unioning its resolved `nodes` list
/// with every resolved `custom_node_map` value (the two can diverge: `nodes`
/// is the last-persisted resolved set, `custom_node_map` may carry a fresher
/// per-node-type decision not yet folded into `nodes`).
pub fn referenced_packages(manifest: &Manifest) -> HashSet<String> {
    let mut referenced = HashSet::new();
    for name in manifest.list_workflow_names() {
        let Some(workflow) = manifest.get_workflow(&name) else { continue };
        referenced.extend(workflow.nodes.iter().cloned());
        for mapping in workflow.custom_node_map.values() {
            if let Some(package_id) = mapping.package_id() {
                referenced.insert(package_id.to_string());
            }
        }
    }
    referenced
}

/// Removes every installed node not in `referenced_packages(manifest)`,
/// skipping anything named in `exclude`. Returns the ids removed.
pub fn prune(manifest: &mut Manifest, custom_nodes_dir: &Path, exclude: &HashSet<String>) -> NodeResult<Vec<String>> {
    let referenced = referenced_packages(manifest);
    let installed: Vec<String> = manifest.list_nodes().keys().cloned().collect();
    let mut removed = Vec::new();

    for package_id in installed {
        if referenced.contains(&package_id) || exclude.contains(&package_id) {
            continue;
        }
        remove_node(manifest, custom_nodes_dir, &package_id)?;
        removed.push(package_id);
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use comfygit_manifest::{CustomNodeMapping, NodeEntry, NodeSource};

    #[test]
    fn prune_removes_unreferenced_and_keeps_excluded_and_referenced() {
        let dir = tempfile::tempdir().unwrap();
        let custom_nodes = dir.path().join("custom_nodes");
        for name in ["Used", "Unused", "Kept"] {
            fs_err::create_dir_all(custom_nodes.join(name)).unwrap();
        }

        let mut manifest = Manifest::new(dir.path().join("pyproject.toml"));
        for (package_id, name) in [("used-pack", "Used"), ("unused-pack", "Unused"), ("kept-pack", "Kept")] {
            manifest.set_node(
                package_id,
                &NodeEntry { name: name.into(), repository: None, version: None, source: NodeSource::Registry },
            );
        }
        manifest.set_custom_node_map("wf1", "SomeNode", &CustomNodeMapping::Package("used-pack".into()));

        let mut exclude = HashSet::new();
        exclude.insert("kept-pack".to_string());

        let removed = prune(&mut manifest, &custom_nodes, &exclude).unwrap();

        assert_eq!(removed, vec!["unused-pack".to_string()]);
        assert!(manifest.get_node("used-pack").is_some());
        assert!(manifest.get_node("kept-pack").is_some());
        assert!(manifest.get_node("unused-pack").is_none());
    }
}
