//! A workflow JSON document kept as a live [`serde_json::Value`] tree rather
//! than a lossy typed struct, so fields this crate doesn't understand survive
//! a parse/reconstruct round trip untouched — the same reasoning
//! `comfygit_manifest` applies to `toml_edit::DocumentMut`.

use std::path::Path;

use serde_json::Value;

use crate::error::{WorkflowError, WorkflowResult};

#[derive(Debug, Clone)]
pub struct WorkflowDocument {
    value: Value,
}

impl WorkflowDocument {
    pub fn parse(contents: &str) -> WorkflowResult<Self> {
        let value: Value = serde_json::from_str(contents).map_err(|e| WorkflowError::InvalidJson {
            offset: e.column(),
            message: e.to_string(),
        })?;
        if value.get("nodes").and_then(Value::as_array).is_none() {
            return Err(WorkflowError::MissingNodes);
        }
        Ok(Self { value })
    }

    pub fn load(path: &Path) -> WorkflowResult<Self> {
        let contents = fs_err::read_to_string(path).map_err(|e| WorkflowError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&contents)
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn top_level_nodes(&self) -> &[Value] {
        self.value
            .get("nodes")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn subgraphs(&self) -> &[Value] {
        self.value
            .pointer("/definitions/subgraphs")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Set of subgraph UUIDs defined in this document, used to recognize
    /// subgraph reference nodes by their `type` field.
    pub fn subgraph_ids(&self) -> std::collections::HashSet<String> {
        self.subgraphs()
            .iter()
            .filter_map(|s| s.get("id").and_then(Value::as_str).map(str::to_string))
            .collect()
    }

    /// Reconstructs the document's JSON text. Stable and deterministic for a
    /// given parsed tree: the same serializer, with the same key order
    /// (`serde_json`'s `preserve_order` feature keeps the order seen on
    /// parse), always produces the same bytes for the same `Value`.
    pub fn to_json_string(&self) -> WorkflowResult<String> {
        Ok(serde_json::to_string_pretty(&self.value)?)
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}
