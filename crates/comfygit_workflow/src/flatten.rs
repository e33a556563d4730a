use serde_json::Value;

use crate::document::WorkflowDocument;
use crate::model::FlatNode;

/// Produces the virtual flat node list: all top-level real nodes plus every
/// node inside each subgraph definition, skipping subgraph reference nodes
/// (whose `type` is a subgraph's own UUID — they instantiate the subgraph,
/// they are not a node type needing a package).
pub fn flatten(doc: &WorkflowDocument) -> Vec<FlatNode> {
    let subgraph_ids = doc.subgraph_ids();
    let mut out = Vec::new();

    for node in doc.top_level_nodes() {
        let Some(node_type) = node.get("type").and_then(Value::as_str) else {
            continue;
        };
        if subgraph_ids.contains(node_type) {
            continue;
        }
        if let Some(flat) = to_flat_node(node, node.get("id"), None) {
            out.push(flat);
        }
    }

    for subgraph in doc.subgraphs() {
        let Some(uuid) = subgraph.get("id").and_then(Value::as_str) else {
            continue;
        };
        let inner_nodes = subgraph
            .get("nodes")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for node in inner_nodes {
            let Some(node_type) = node.get("type").and_then(Value::as_str) else {
                continue;
            };
            // A subgraph can reference another subgraph; that's still a
            // reference node, not a resolvable type, even nested.
            if subgraph_ids.contains(node_type) {
                continue;
            }
            if let Some(flat) = to_flat_node(node, node.get("id"), Some(uuid)) {
                out.push(flat);
            }
        }
    }

    out
}

fn to_flat_node(node: &Value, id: Option<&Value>, scope: Option<&str>) -> Option<FlatNode> {
    let node_type = node.get("type").and_then(Value::as_str)?.to_string();
    let raw_id = id.map(value_to_id_string).unwrap_or_default();
    let id = match scope {
        Some(uuid) => format!("{uuid}:{raw_id}"),
        None => raw_id,
    };
    Some(FlatNode {
        id,
        node_type,
        widgets_values: node.get("widgets_values").cloned(),
    })
}

fn value_to_id_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_subgraph_nodes_with_scoped_ids() {
        let doc = WorkflowDocument::parse(
            &json!({
                "nodes": [{"id": 1, "type": "sg-uuid-1"}],
                "definitions": {
                    "subgraphs": [{
                        "id": "sg-uuid-1",
                        "name": "inner",
                        "nodes": [{"id": 5, "type": "KSampler"}],
                    }]
                }
            })
            .to_string(),
        )
        .unwrap();

        let flat = flatten(&doc);
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].id, "sg-uuid-1:5");
        assert_eq!(flat[0].node_type, "KSampler");
    }
}
