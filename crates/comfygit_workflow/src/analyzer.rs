use std::collections::BTreeSet;

use crate::document::WorkflowDocument;
use crate::extract::{classify, extract_model_references};
use crate::flatten::flatten;
use crate::model::{AnalysisResult, NodeClass};
use crate::normalize::content_hash;

/// Runs the full analysis algorithm (§4.3) over an already-parsed document:
/// normalize for hashing, flatten subgraphs, classify node types, extract
/// model references.
pub fn analyze(doc: &WorkflowDocument) -> AnalysisResult {
    let content_hash = content_hash(doc.value());
    let flat_nodes = flatten(doc);

    let custom_node_types: BTreeSet<String> = flat_nodes
        .iter()
        .filter(|n| classify(&n.node_type) == NodeClass::Custom)
        .map(|n| n.node_type.clone())
        .collect();

    let model_references = extract_model_references(&flat_nodes);

    AnalysisResult {
        content_hash,
        custom_node_types: custom_node_types.into_iter().collect(),
        model_references,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn analyzes_two_node_workflow() {
        let doc = WorkflowDocument::parse(
            &json!({
                "nodes": [
                    {"id": 1, "type": "CheckpointLoaderSimple", "widgets_values": ["SD1.5/photon.safetensors"]},
                    {"id": 2, "type": "ComfyUI_IPAdapter_plus_IPAdapterApply", "widgets_values": [0.8]},
                ]
            })
            .to_string(),
        )
        .unwrap();

        let result = analyze(&doc);
        assert_eq!(result.custom_node_types, vec!["ComfyUI_IPAdapter_plus_IPAdapterApply".to_string()]);
        assert_eq!(result.model_references.len(), 1);
        assert_eq!(result.model_references[0].widget_value, "SD1.5/photon.safetensors");
    }
}
