use comfygit_manifest::{
    CustomNodeMapping, Manifest, ModelCriticality, ModelResolutionStatus, ModelSourceRef,
    NodeEntry, NodeSource, WorkflowModelEntry, WorkflowModelNodeRef,
};
use indoc::indoc;

fn sample() -> &'static str {
    indoc! {r#"
        # A hand-edited comment that must survive every save.
        [project]
        name = "my-environment"
        dependencies = ["numpy>=1.26"]

        [tool.comfygit.environment]
        comfyui_ref = "v0.3.10"
        python_version = "3.11"
    "#}
}

#[test]
fn comments_and_order_survive_a_round_trip() {
    let manifest = Manifest::from_str("pyproject.toml".into(), sample()).unwrap();
    let rendered = manifest.document().to_string();
    assert!(rendered.contains("# A hand-edited comment that must survive every save."));
    assert!(rendered.find("[project]").unwrap() < rendered.find("[tool.comfygit").unwrap());
}

#[test]
fn add_node_creates_group_and_is_idempotent() {
    let mut manifest = Manifest::from_str("pyproject.toml".into(), sample()).unwrap();
    let entry = NodeEntry {
        name: "ComfyUI-Impact-Pack".to_string(),
        repository: Some("https://github.com/ltdrdata/ComfyUI-Impact-Pack".to_string()),
        version: Some("abc123".to_string()),
        source: NodeSource::Git,
    };
    manifest.set_node("impact-pack", &entry);
    manifest.add_dependencies_from_list(
        "node/impact-pack",
        &["segment-anything>=1.0".to_string()],
    );
    manifest.add_dependencies_from_list(
        "node/impact-pack",
        &["segment-anything>=1.0".to_string()],
    );

    assert_eq!(manifest.get_node("impact-pack"), Some(entry));
    assert_eq!(
        manifest.list_dependencies(Some("node/impact-pack")),
        vec!["segment-anything>=1.0".to_string()]
    );
}

#[test]
fn remove_node_clears_group_and_custom_node_map_entries() {
    let mut manifest = Manifest::from_str("pyproject.toml".into(), sample()).unwrap();
    manifest.set_node(
        "impact-pack",
        &NodeEntry {
            name: "ComfyUI-Impact-Pack".to_string(),
            repository: None,
            version: None,
            source: NodeSource::Development,
        },
    );
    manifest.add_dependencies_from_list("node/impact-pack", &["requests".to_string()]);
    manifest.set_workflow_nodes("w", &["impact-pack".to_string()]);
    manifest.set_custom_node_map(
        "w",
        "ImpactNode",
        &CustomNodeMapping::Package("impact-pack".to_string()),
    );

    manifest.remove_node("impact-pack");

    assert!(manifest.get_node("impact-pack").is_none());
    assert!(manifest.list_dependencies(Some("node/impact-pack")).is_empty());
    let workflow = manifest.get_workflow("w").unwrap();
    assert!(workflow.custom_node_map.get("ImpactNode").is_none());
}

#[test]
fn workflow_model_upsert_replaces_matching_entry_and_keeps_nodes_homogeneous() {
    let mut manifest = Manifest::from_str("pyproject.toml".into(), sample()).unwrap();
    let node_ref = WorkflowModelNodeRef {
        node_id: "3".to_string(),
        node_type: "CheckpointLoaderSimple".to_string(),
        widget_index: 0,
        widget_value: "SD1.5/photon.safetensors".to_string(),
    };
    let entry = WorkflowModelEntry {
        filename: "photon.safetensors".to_string(),
        hash: Some("deadbeef".to_string()),
        category: "checkpoints".to_string(),
        criticality: comfygit_manifest::ModelCriticality::Required,
        status: ModelResolutionStatus::Resolved,
        sources: vec![ModelSourceRef {
            source_type: "civitai".to_string(),
            url: "https://civitai.com/models/1".to_string(),
        }],
        nodes: vec![node_ref.clone()],
        auto_resolved: true,
    };
    manifest.upsert_workflow_model("w", &entry);

    // Re-running resolution with an updated hash should replace, not duplicate.
    let mut updated = entry.clone();
    updated.hash = Some("c0ffee".to_string());
    manifest.upsert_workflow_model("w", &updated);

    let workflow = manifest.get_workflow("w").unwrap();
    assert_eq!(workflow.models.len(), 1);
    assert_eq!(workflow.models[0].hash.as_deref(), Some("c0ffee"));
}

#[test]
fn constraint_add_replaces_by_package_name() {
    let mut manifest = Manifest::from_str("pyproject.toml".into(), sample()).unwrap();
    manifest.set_constraint("torch>=2.0,<2.1");
    manifest.set_constraint("torch==2.4.0");
    let constraints = manifest.list_constraints();
    assert_eq!(constraints.get("torch").map(String::as_str), Some("torch==2.4.0"));
    assert_eq!(constraints.len(), 1);
}

#[test]
fn delete_workflow_removes_entire_entry() {
    let mut manifest = Manifest::from_str("pyproject.toml".into(), sample()).unwrap();
    manifest.set_workflow_nodes("w", &["a".to_string()]);
    assert!(manifest.get_workflow("w").is_some());
    manifest.delete_workflow("w");
    assert!(manifest.get_workflow("w").is_none());
}

#[test]
fn save_is_atomic_and_reloadable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pyproject.toml");
    let mut manifest = Manifest::new(path.clone());
    manifest.set_environment_config(&comfygit_manifest::EnvironmentConfig {
        comfyui_ref: Some("v0.3.10".to_string()),
        python_version: Some("3.11".to_string()),
        torch_backend: Some("cpu".to_string()),
        torch_version: None,
        torch_index_url: None,
    });
    manifest.save().unwrap();
    assert!(!path.with_extension("toml.tmp").exists());

    let reloaded = Manifest::load(&path).unwrap();
    assert_eq!(
        reloaded.environment_config().comfyui_ref.as_deref(),
        Some("v0.3.10")
    );
}
