//! Progressive persistence: every resolution decision is written to the
//! manifest as soon as it's made (§4.4 Progressive persistence), so a
//! cancelled resolution run preserves whatever was already decided.

use comfygit_manifest::{
    CustomNodeMapping, Manifest, ModelCriticality, ModelRecord, ModelResolutionStatus, WorkflowModelEntry,
    WorkflowModelNodeRef,
};
use comfygit_model_index::IndexedModel;
use comfygit_workflow::ModelReference;

use crate::outcome::Resolution;

pub fn persist_node_resolution(manifest: &mut Manifest, workflow_name: &str, node_type: &str, outcome: &Resolution<String>) {
    match outcome {
        Resolution::Resolved { value, .. } => {
            manifest.set_custom_node_map(workflow_name, node_type, &CustomNodeMapping::Package(value.clone()));
        }
        Resolution::Optional => {
            manifest.set_custom_node_map(workflow_name, node_type, &CustomNodeMapping::Optional(false));
        }
        Resolution::Ambiguous { .. } | Resolution::Unresolved { .. } => {
            // No decision yet; leave any prior mapping untouched.
        }
    }
}

/// Persists a model resolution decision, upserting the global model record
/// (when an indexed model backs the resolution) and the workflow's
/// per-reference entry in one call.
#[allow(clippy::too_many_arguments)]
pub fn persist_model_resolution(
    manifest: &mut Manifest,
    workflow_name: &str,
    reference: &ModelReference,
    category: &str,
    criticality: ModelCriticality,
    outcome: &Resolution<crate::model_resolver::ResolvedModel>,
    indexed: Option<&IndexedModel>,
) {
    let node_ref = WorkflowModelNodeRef {
        node_id: reference.node_id.clone(),
        node_type: reference.node_type.clone(),
        widget_index: reference.widget_index,
        widget_value: reference.widget_value.clone(),
    };

    let (hash, status, auto_resolved) = match outcome {
        Resolution::Resolved { value, auto_resolved } => {
            if let Some(model) = indexed {
                manifest.upsert_model(
                    criticality,
                    &ModelRecord {
                        hash: value.hash.clone(),
                        filename: basename(&value.relative_path),
                        size: model.file_size,
                        relative_path: value.relative_path.clone(),
                        blake3_hash: model.blake3_hash.clone(),
                        sha256_hash: model.sha256_hash.clone(),
                        sources: Vec::new(),
                    },
                );
            }
            (Some(value.hash.clone()), ModelResolutionStatus::Resolved, *auto_resolved)
        }
        Resolution::Unresolved { .. } => (None, ModelResolutionStatus::Unresolved, false),
        Resolution::Ambiguous { .. } | Resolution::Optional => return,
    };

    let entry = WorkflowModelEntry {
        filename: basename(&reference.widget_value),
        hash,
        category: category.to_string(),
        criticality,
        status,
        sources: Vec::new(),
        nodes: vec![node_ref],
        auto_resolved,
    };
    manifest.upsert_workflow_model(workflow_name, &entry);
}

fn basename(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}
