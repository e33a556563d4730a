//! Commit safety predicate (§4.8): a commit is permitted only if every
//! tracked workflow has no unresolved node or model entry that isn't
//! explicitly marked optional.

use comfygit_manifest::Manifest;

/// The first blocking `(workflow, reason)` pair found, if any. `None` means
/// the manifest is clean to commit.
pub fn blocking_issue(manifest: &Manifest) -> Option<(String, String)> {
    for name in manifest.list_workflow_names() {
        let Some(entry) = manifest.get_workflow(&name) else { continue };
        if entry.has_unresolved_nodes() {
            return Some((name, "has an unresolved custom node".to_string()));
        }
        if entry.has_blocking_unresolved() {
            return Some((name, "has an unresolved required model".to_string()));
        }
    }
    None
}

pub fn is_safe_to_commit(manifest: &Manifest) -> bool {
    blocking_issue(manifest).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use comfygit_manifest::{CustomNodeMapping, ModelCriticality, ModelResolutionStatus, WorkflowModelEntry};

    #[test]
    fn clean_manifest_is_safe() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = Manifest::new(dir.path().join("pyproject.toml"));
        assert!(is_safe_to_commit(&manifest));
    }

    #[test]
    fn unresolved_required_model_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let mut manifest = Manifest::new(dir.path().join("pyproject.toml"));
        manifest.upsert_workflow_model(
            "wf1",
            &WorkflowModelEntry {
                filename: "sd15.safetensors".into(),
                hash: None,
                category: "checkpoints".into(),
                criticality: ModelCriticality::Required,
                status: ModelResolutionStatus::Unresolved,
                sources: Vec::new(),
                nodes: Vec::new(),
                auto_resolved: false,
            },
        );
        assert!(!is_safe_to_commit(&manifest));
    }

    #[test]
    fn optional_unresolved_model_does_not_block() {
        let dir = tempfile::tempdir().unwrap();
        let mut manifest = Manifest::new(dir.path().join("pyproject.toml"));
        manifest.upsert_workflow_model(
            "wf1",
            &WorkflowModelEntry {
                filename: "extra.safetensors".into(),
                hash: None,
                category: "loras".into(),
                criticality: ModelCriticality::Optional,
                status: ModelResolutionStatus::Unresolved,
                sources: Vec::new(),
                nodes: Vec::new(),
                auto_resolved: false,
            },
        );
        assert!(is_safe_to_commit(&manifest));
    }

    #[test]
    fn unresolved_node_blocks_unless_marked_optional() {
        let dir = tempfile::tempdir().unwrap();
        let mut manifest = Manifest::new(dir.path().join("pyproject.toml"));
        manifest.set_workflow_nodes("wf1", &["SomeCustomNode".to_string()]);
        assert!(!is_safe_to_commit(&manifest));

        manifest.set_custom_node_map("wf1", "SomeCustomNode", &CustomNodeMapping::Optional(false));
        assert!(is_safe_to_commit(&manifest));
    }
}
