//! Constants shared by every `comfygit_*` crate: file and directory names that
//! make up the on-disk layout described in the data model, plus a handful of
//! console styles used for human-facing output.

use console::Style;
use once_cell::sync::Lazy;

/// Name of the hidden configuration directory inside an environment.
pub const CEC_DIR: &str = ".cec";
/// The declarative manifest, always a `pyproject.toml` inside [`CEC_DIR`].
pub const MANIFEST_FILE: &str = "pyproject.toml";
/// The Python lockfile maintained by the environment broker.
pub const LOCKFILE_FILE: &str = "uv.lock";
/// Pinned Python version file written alongside the manifest.
pub const PYTHON_VERSION_FILE: &str = ".python-version";
/// Directory inside `.cec/` holding the committed workflow mirror.
pub const WORKFLOWS_DIR: &str = "workflows";
/// Directory inside `.cec/` holding development node sources.
pub const DEV_NODES_DIR: &str = "dev_nodes";
/// Git directory inside `.cec/`.
pub const GIT_DIR: &str = ".git";

/// Upstream ComfyUI checkout directory name inside an environment.
pub const COMFYUI_DIR: &str = "ComfyUI";
/// Default upstream ComfyUI repository cloned into the clone cache.
pub const COMFYUI_REPO_URL: &str = "https://github.com/comfyanonymous/ComfyUI";
/// Custom nodes directory inside the ComfyUI checkout.
pub const CUSTOM_NODES_DIR: &str = "custom_nodes";
/// Active workflows directory inside the ComfyUI checkout.
pub const COMFYUI_WORKFLOWS_DIR: &str = "user/default/workflows";
/// Name of the models symlink/junction inside the ComfyUI checkout.
pub const MODELS_LINK: &str = "models";
/// Name of the per-environment Python virtual environment directory.
pub const VENV_DIR: &str = ".venv";

/// Suffix appended to a development node directory on non-destructive removal.
pub const DISABLED_SUFFIX: &str = ".disabled";

/// Workspace metadata file, relative to the workspace root.
pub const WORKSPACE_METADATA_FILE: &str = ".metadata/workspace.json";
/// Model index SQLite database, relative to the workspace root.
pub const MODEL_INDEX_DB: &str = ".metadata/models.db";
/// Directory name for the workspace-wide model pool.
pub const MODELS_POOL_DIR: &str = "models";
/// Directory name for the node archive cache, keyed by `<package-id>@<ref>`.
pub const NODE_CACHE_DIR: &str = "cache/custom_nodes";
/// Directory name for the ComfyUI clone cache, keyed by ref.
pub const COMFYUI_CACHE_DIR: &str = "cache/comfyui";
/// Directory name for cached responses from external APIs.
pub const API_CACHE_DIR: &str = "cache/api_cache";

/// Default environment name used when none is given explicitly.
pub const DEFAULT_ENVIRONMENT_NAME: &str = "default";

/// Prefix for the `tool.<product>` table inside the manifest.
pub const TOOL_PREFIX: &str = "comfygit";
/// Prefix for a node's optional-dependency group name: `node/<package-id>`.
pub const NODE_GROUP_PREFIX: &str = "node";

/// Schema version written to `workspace.json`.
pub const WORKSPACE_SCHEMA_VERSION: u32 = 1;
/// Schema version of the model index SQLite database.
pub const MODEL_INDEX_SCHEMA_VERSION: u32 = 1;
/// Schema version of the workflow analyzer cache SQLite database.
pub const WORKFLOW_CACHE_SCHEMA_VERSION: u32 = 1;

/// Default per-chunk size for the model quick-hash sampler (15 MiB).
pub const QUICK_HASH_CHUNK_SIZE: u64 = 15 * 1024 * 1024;

/// Default timeout, in seconds, for external HTTP/VCS operations.
pub const DEFAULT_EXTERNAL_TIMEOUT_SECS: u64 = 120;
/// Default bounded worker pool size for model hashing / download batching.
pub const DEFAULT_WORKER_POOL_SIZE: usize = 4;

/// Placeholder files tolerated inside an empty `models/` directory.
pub const MODELS_PLACEHOLDER_FILES: &[&str] =
    &[".gitkeep", ".gitignore", "Put models here.txt"];

/// Recognized model file extensions used when scanning custom node widgets.
pub const DEFAULT_MODEL_EXTENSIONS: &[&str] =
    &["safetensors", "ckpt", "pt", "pth", "bin", "onnx"];

pub static NEW_STYLE: Lazy<Style> = Lazy::new(|| Style::new().green());
pub static REMOVED_STYLE: Lazy<Style> = Lazy::new(|| Style::new().red());
pub static WARN_STYLE: Lazy<Style> = Lazy::new(|| Style::new().yellow());
pub static ENVIRONMENT_STYLE: Lazy<Style> = Lazy::new(|| Style::new().magenta());
pub static PACKAGE_STYLE: Lazy<Style> = Lazy::new(|| Style::new().cyan());

/// Formats a package optional-dependency group name for a node: `node/<id>`.
pub fn node_group_name(package_id: &str) -> String {
    format!("{NODE_GROUP_PREFIX}/{package_id}")
}

/// Formats the `tool.<product>.<rest>` dotted key prefix.
pub fn tool_key(rest: &str) -> String {
    format!("{TOOL_PREFIX}.{rest}")
}
