use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// `tool.<product>.environment`: ComfyUI ref, Python version, PyTorch backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub comfyui_ref: Option<String>,
    pub python_version: Option<String>,
    pub torch_backend: Option<String>,
    /// The concrete installed torch version, written back after a backend
    /// install (see the Python environment broker's PyTorch handling).
    pub torch_version: Option<String>,
    pub torch_index_url: Option<String>,
}

/// Where a node package's installed form came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeSource {
    Registry,
    Git,
    Development,
}

impl NodeSource {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeSource::Registry => "registry",
            NodeSource::Git => "git",
            NodeSource::Development => "development",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "registry" => Some(NodeSource::Registry),
            "git" => Some(NodeSource::Git),
            "development" => Some(NodeSource::Development),
            _ => None,
        }
    }
}

/// `tool.<product>.nodes.<package-id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub name: String,
    pub repository: Option<String>,
    pub version: Option<String>,
    pub source: NodeSource,
}

/// Model category: `required` models block a clean commit when unresolved,
/// `optional` models never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelCriticality {
    Required,
    Optional,
}

impl ModelCriticality {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelCriticality::Required => "required",
            ModelCriticality::Optional => "optional",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "required" => Some(ModelCriticality::Required),
            "optional" => Some(ModelCriticality::Optional),
            _ => None,
        }
    }
}

/// `tool.<product>.models.<category>.<model-hash>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub hash: String,
    pub filename: String,
    pub size: u64,
    pub relative_path: String,
    pub blake3_hash: Option<String>,
    pub sha256_hash: Option<String>,
    pub sources: Vec<ModelSourceRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSourceRef {
    pub source_type: String,
    pub url: String,
}

/// A `false` entry in `custom_node_map` means "mark optional"; otherwise it
/// names the package id that supplies the node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CustomNodeMapping {
    Package(String),
    Optional(bool),
}

impl CustomNodeMapping {
    pub fn package_id(&self) -> Option<&str> {
        match self {
            CustomNodeMapping::Package(id) => Some(id),
            CustomNodeMapping::Optional(_) => None,
        }
    }

    pub fn is_marked_optional(&self) -> bool {
        matches!(self, CustomNodeMapping::Optional(false))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelResolutionStatus {
    Resolved,
    Unresolved,
}

impl ModelResolutionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelResolutionStatus::Resolved => "resolved",
            ModelResolutionStatus::Unresolved => "unresolved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "resolved" => Some(ModelResolutionStatus::Resolved),
            "unresolved" => Some(ModelResolutionStatus::Unresolved),
            _ => None,
        }
    }
}

/// One `(node_id, node_type, widget_index, widget_value)` provenance tuple for
/// a model reference inside a tracked workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowModelNodeRef {
    pub node_id: String,
    pub node_type: String,
    pub widget_index: i64,
    pub widget_value: String,
}

/// One entry in `tool.<product>.workflows.<name>.models`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowModelEntry {
    pub filename: String,
    pub hash: Option<String>,
    pub category: String,
    pub criticality: ModelCriticality,
    pub status: ModelResolutionStatus,
    pub sources: Vec<ModelSourceRef>,
    pub nodes: Vec<WorkflowModelNodeRef>,
    /// Set when the resolution engine made this choice without prompting.
    pub auto_resolved: bool,
}

/// `tool.<product>.workflows.<name>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEntry {
    pub nodes: Vec<String>,
    pub custom_node_map: IndexMap<String, CustomNodeMapping>,
    pub models: Vec<WorkflowModelEntry>,
}

impl WorkflowEntry {
    pub fn has_blocking_unresolved(&self) -> bool {
        self.models
            .iter()
            .any(|m| m.status == ModelResolutionStatus::Unresolved && m.criticality == ModelCriticality::Required)
    }

    /// A custom node type this workflow uses has no resolved package and
    /// isn't explicitly marked optional. Checked against `custom_node_map`
    /// (node-type keyed), not `nodes` (the resolved package-id list).
    pub fn has_unresolved_nodes(&self) -> bool {
        self.custom_node_map
            .values()
            .any(|mapping| mapping.package_id().is_none() && !mapping.is_marked_optional())
    }
}

/// `[tool.uv.constraint-dependencies]`: global version constraints.
pub type Constraints = IndexMap<String, String>;

/// Fully typed view of the manifest, produced by [`crate::Manifest::load`]'s
/// internal parse step and handed back from [`crate::Manifest::view`].
#[derive(Debug, Clone, Default)]
pub struct ManifestView {
    pub main_dependencies: Vec<String>,
    pub optional_dependencies: IndexMap<String, Vec<String>>,
    pub environment: EnvironmentConfig,
    pub nodes: IndexMap<String, NodeEntry>,
    pub models: IndexMap<ModelCriticality, IndexMap<String, ModelRecord>>,
    pub workflows: IndexMap<String, WorkflowEntry>,
    pub constraints: Constraints,
}
