//! Workflow tracking (§4.3/§4.4 bridge): for every workflow JSON ComfyUI
//! knows about, run analysis and the node/model resolution chains, persist
//! each decision into the manifest, and copy the file into the committed
//! `.cec/workflows/` directory so the mirror step doesn't treat it as a
//! stray ComfyUI-side file and delete it.
//!
//! Runs with the non-interactive "auto" strategy (§9): the caller supplies
//! the registry lookup (network-backed in production, a test double in
//! tests); the user strategies always take the resolver's own best
//! candidate rather than prompting.

use std::collections::BTreeSet;
use std::path::Path;

use comfygit_manifest::{Manifest, ModelCriticality};
use comfygit_model_index::ModelIndex;
use comfygit_resolution::{
    persist_model_resolution, persist_node_resolution, resolve_model_reference, resolve_node_type, AutoModelStrategy,
    AutoNodeStrategy, NodeRegistryLookup, Resolution, StrsimNodeMatcher,
};
use comfygit_workflow::{analyze, loader_widgets, WorkflowDocument};

use crate::error::ReconcileResult;

/// Names of workflows whose tracking was updated this pass.
pub type WorkflowTrackingReport = Vec<String>;

/// Analyzes and resolves every `.json` file under `comfyui_workflows_dir`,
/// writing the results into `manifest` and copying each file into
/// `committed_workflows_dir`. Must run before [`crate::pipeline::reconcile`]'s
/// workflow mirror step, which deletes any committed-side file it can't
/// match to a ComfyUI-side one.
pub fn track_workflows(
    manifest: &mut Manifest,
    comfyui_workflows_dir: &Path,
    committed_workflows_dir: &Path,
    model_index: &ModelIndex,
    registry: &dyn NodeRegistryLookup,
) -> ReconcileResult<WorkflowTrackingReport> {
    if !comfyui_workflows_dir.exists() {
        return Ok(Vec::new());
    }

    let matcher = StrsimNodeMatcher;
    let mut node_strategy = AutoNodeStrategy;
    let mut model_strategy = AutoModelStrategy;

    let mut tracked = Vec::new();
    for entry in fs_err::read_dir(comfyui_workflows_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let name = name.to_string();

        let doc = WorkflowDocument::load(&path)?;
        let analysis = analyze(&doc);
        let existing = manifest.get_workflow(&name).unwrap_or_default();

        let mut resolved_packages: BTreeSet<String> = existing
            .custom_node_map
            .values()
            .filter_map(|mapping| mapping.package_id().map(str::to_string))
            .collect();

        for node_type in &analysis.custom_node_types {
            let outcome = resolve_node_type(node_type, &existing.custom_node_map, registry, Some(&matcher), &mut node_strategy);
            if let Resolution::Resolved { value, .. } = &outcome {
                resolved_packages.insert(value.clone());
            }
            persist_node_resolution(manifest, &name, node_type, &outcome);
        }
        manifest.set_workflow_nodes(&name, &resolved_packages.into_iter().collect::<Vec<_>>());

        for reference in &analysis.model_references {
            let category = loader_widgets(&reference.node_type)
                .and_then(|widgets| widgets.iter().find(|w| w.widget_index as i64 == reference.widget_index))
                .map(|w| w.category);
            let outcome = resolve_model_reference(reference, category, &existing.models, model_index, &mut model_strategy)?;
            let indexed = match &outcome {
                Resolution::Resolved { value, .. } => model_index.find_by_hash(&value.hash)?.into_iter().next(),
                _ => None,
            };
            persist_model_resolution(
                manifest,
                &name,
                reference,
                category.unwrap_or("uncategorized"),
                ModelCriticality::Required,
                &outcome,
                indexed.as_ref(),
            );
        }

        fs_err::create_dir_all(committed_workflows_dir)?;
        fs_err::copy(&path, committed_workflows_dir.join(format!("{name}.json")))?;
        tracked.push(name);
    }

    Ok(tracked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EmptyRegistry;
    impl NodeRegistryLookup for EmptyRegistry {
        fn candidates_for(&self, _node_type: &str) -> Vec<String> {
            Vec::new()
        }
    }

    fn make_index(dir: &std::path::Path) -> ModelIndex {
        fs_err::create_dir_all(dir.join("checkpoints")).unwrap();
        fs_err::write(dir.join("checkpoints/photon.safetensors"), vec![0u8; 4096]).unwrap();
        let index = ModelIndex::open(&dir.join("models.db"), dir.to_path_buf()).unwrap();
        index.sync(false).unwrap();
        index
    }

    #[test]
    fn tracks_a_new_workflow_into_the_manifest_and_committed_dir() {
        let dir = tempfile::tempdir().unwrap();
        let comfyui_workflows = dir.path().join("comfyui_workflows");
        let committed_workflows = dir.path().join("committed_workflows");
        fs_err::create_dir_all(&comfyui_workflows).unwrap();
        fs_err::write(
            comfyui_workflows.join("w.json"),
            json!({
                "nodes": [
                    {"id": 1, "type": "CheckpointLoaderSimple", "widgets_values": ["photon.safetensors"]},
                    {"id": 2, "type": "ComfyUI_IPAdapter_plus_IPAdapterApply", "widgets_values": [0.8]},
                ]
            })
            .to_string(),
        )
        .unwrap();

        let model_index = make_index(dir.path());
        let mut manifest = Manifest::new(dir.path().join("pyproject.toml"));
        let registry = EmptyRegistry;

        let tracked = track_workflows(&mut manifest, &comfyui_workflows, &committed_workflows, &model_index, &registry).unwrap();

        assert_eq!(tracked, vec!["w".to_string()]);
        assert!(committed_workflows.join("w.json").exists());

        let workflow = manifest.get_workflow("w").unwrap();
        assert!(workflow.custom_node_map.contains_key("ComfyUI_IPAdapter_plus_IPAdapterApply"));
        assert!(workflow.has_unresolved_nodes(), "no registry candidates means the custom node stays unresolved");
        assert_eq!(workflow.models.len(), 1);
        assert_eq!(workflow.models[0].status, comfygit_manifest::ModelResolutionStatus::Resolved);
    }

    #[test]
    fn missing_comfyui_dir_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let model_index = make_index(dir.path());
        let mut manifest = Manifest::new(dir.path().join("pyproject.toml"));
        let registry = EmptyRegistry;

        let tracked = track_workflows(
            &mut manifest,
            &dir.path().join("nonexistent"),
            &dir.path().join("committed"),
            &model_index,
            &registry,
        )
        .unwrap();
        assert!(tracked.is_empty());
    }
}
