use serde_json::Value;

use comfygit_consts::DEFAULT_MODEL_EXTENSIONS;

use crate::builtin;
use crate::model::{FlatNode, ModelReference, NodeClass};

pub fn classify(node_type: &str) -> NodeClass {
    if builtin::is_builtin(node_type) {
        NodeClass::Builtin
    } else {
        NodeClass::Custom
    }
}

/// Extracts model references from every flattened node: builtin loaders use
/// the bundled widget-index table; custom nodes are scanned for any string
/// widget value that ends in a known model extension.
pub fn extract_model_references(nodes: &[FlatNode]) -> Vec<ModelReference> {
    let mut out = Vec::new();
    for node in nodes {
        let Some(Value::Array(widgets)) = &node.widgets_values else {
            continue;
        };
        match builtin::loader_widgets(&node.node_type) {
            Some(loader_widgets) => {
                for lw in loader_widgets {
                    if let Some(Value::String(value)) = widgets.get(lw.widget_index) {
                        out.push(ModelReference {
                            node_id: node.id.clone(),
                            node_type: node.node_type.clone(),
                            widget_index: lw.widget_index as i64,
                            widget_value: value.clone(),
                        });
                    }
                }
            }
            None => {
                for (idx, widget) in widgets.iter().enumerate() {
                    if let Value::String(value) = widget {
                        if looks_like_model_path(value) {
                            out.push(ModelReference {
                                node_id: node.id.clone(),
                                node_type: node.node_type.clone(),
                                widget_index: idx as i64,
                                widget_value: value.clone(),
                            });
                        }
                    }
                }
            }
        }
    }
    out
}

fn looks_like_model_path(value: &str) -> bool {
    DEFAULT_MODEL_EXTENSIONS
        .iter()
        .any(|ext| value.to_ascii_lowercase().ends_with(&format!(".{ext}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FlatNode;
    use serde_json::json;

    #[test]
    fn builtin_loader_uses_table_widget_index() {
        let node = FlatNode {
            id: "1".into(),
            node_type: "CheckpointLoaderSimple".into(),
            widgets_values: Some(json!(["SD1.5/photon.safetensors"])),
        };
        let refs = extract_model_references(&[node]);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].widget_index, 0);
        assert_eq!(refs[0].widget_value, "SD1.5/photon.safetensors");
    }

    #[test]
    fn custom_node_scans_for_extension() {
        let node = FlatNode {
            id: "2".into(),
            node_type: "SomeCustomLoader".into(),
            widgets_values: Some(json!(["not a model", "extra/thing.safetensors", 3])),
        };
        let refs = extract_model_references(&[node]);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].widget_index, 1);
    }
}
