use std::path::{Path, PathBuf};

use comfygit_consts as consts;

/// Paths rooted at the workspace directory, independent of any single
/// environment. See the on-disk layout in the spec's external-interfaces
/// section.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    root: PathBuf,
}

impl WorkspacePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metadata_file(&self) -> PathBuf {
        self.root.join(consts::WORKSPACE_METADATA_FILE)
    }

    pub fn model_index_db(&self) -> PathBuf {
        self.root.join(consts::MODEL_INDEX_DB)
    }

    pub fn default_models_pool(&self) -> PathBuf {
        self.root.join(consts::MODELS_POOL_DIR)
    }

    pub fn environments_dir(&self) -> PathBuf {
        self.root.join("environments")
    }

    pub fn environment_dir(&self, name: &str) -> PathBuf {
        self.environments_dir().join(name)
    }

    pub fn node_cache_dir(&self) -> PathBuf {
        self.root.join(consts::NODE_CACHE_DIR)
    }

    pub fn node_cache_entry(&self, package_id: &str, git_ref: &str) -> PathBuf {
        self.node_cache_dir().join(format!("{package_id}@{git_ref}"))
    }

    pub fn comfyui_cache_dir(&self) -> PathBuf {
        self.root.join(consts::COMFYUI_CACHE_DIR)
    }

    pub fn comfyui_cache_entry(&self, comfyui_ref: &str) -> PathBuf {
        self.comfyui_cache_dir().join(comfyui_ref)
    }

    pub fn api_cache_dir(&self) -> PathBuf {
        self.root.join(consts::API_CACHE_DIR)
    }
}

/// Paths rooted at a single environment directory.
#[derive(Debug, Clone)]
pub struct EnvironmentPaths {
    root: PathBuf,
}

impl EnvironmentPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn comfyui_dir(&self) -> PathBuf {
        self.root.join(consts::COMFYUI_DIR)
    }

    pub fn custom_nodes_dir(&self) -> PathBuf {
        self.comfyui_dir().join(consts::CUSTOM_NODES_DIR)
    }

    pub fn node_dir(&self, dir_name: &str) -> PathBuf {
        self.custom_nodes_dir().join(dir_name)
    }

    pub fn disabled_node_dir(&self, dir_name: &str) -> PathBuf {
        self.custom_nodes_dir()
            .join(format!("{dir_name}{}", consts::DISABLED_SUFFIX))
    }

    pub fn comfyui_workflows_dir(&self) -> PathBuf {
        self.comfyui_dir().join(consts::COMFYUI_WORKFLOWS_DIR)
    }

    pub fn models_link(&self) -> PathBuf {
        self.comfyui_dir().join(consts::MODELS_LINK)
    }

    pub fn venv_dir(&self) -> PathBuf {
        self.root.join(consts::VENV_DIR)
    }

    pub fn cec_dir(&self) -> PathBuf {
        self.root.join(consts::CEC_DIR)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.cec_dir().join(consts::MANIFEST_FILE)
    }

    pub fn lockfile_path(&self) -> PathBuf {
        self.cec_dir().join(consts::LOCKFILE_FILE)
    }

    pub fn python_version_file(&self) -> PathBuf {
        self.cec_dir().join(consts::PYTHON_VERSION_FILE)
    }

    pub fn workflows_mirror_dir(&self) -> PathBuf {
        self.cec_dir().join(consts::WORKFLOWS_DIR)
    }

    pub fn dev_nodes_dir(&self) -> PathBuf {
        self.cec_dir().join(consts::DEV_NODES_DIR)
    }

    pub fn dev_node_source(&self, name: &str) -> PathBuf {
        self.dev_nodes_dir().join(name)
    }

    pub fn git_dir(&self) -> PathBuf {
        self.cec_dir().join(consts::GIT_DIR)
    }
}

/// Resolves the workspace root from `<PRODUCT>_HOME`, falling back to the
/// user's home directory joined with a default workspace name.
pub fn resolve_workspace_root(env_var: &str, default_dir_name: &str) -> Option<PathBuf> {
    if let Ok(value) = std::env::var(env_var) {
        if !value.trim().is_empty() {
            return Some(PathBuf::from(value));
        }
    }
    dirs::home_dir().map(|home| home.join(default_dir_name))
}
