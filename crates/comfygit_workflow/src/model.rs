use serde::{Deserialize, Serialize};

/// A node after flattening subgraphs into the top-level list. `id` is scoped
/// (`"<subgraph-uuid>:<inner-id>"`) for nodes that live inside a subgraph.
#[derive(Debug, Clone)]
pub struct FlatNode {
    pub id: String,
    pub node_type: String,
    pub widgets_values: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    Builtin,
    Custom,
}

/// `(node_id, node_type, widget_index, widget_value)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelReference {
    pub node_id: String,
    pub node_type: String,
    pub widget_index: i64,
    pub widget_value: String,
}

/// Full analyzer output for one workflow document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub content_hash: String,
    /// Distinct custom node class names used (builtin types are excluded;
    /// they never need resolution).
    pub custom_node_types: Vec<String>,
    pub model_references: Vec<ModelReference>,
}
