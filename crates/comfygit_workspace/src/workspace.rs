use std::path::PathBuf;

use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::metadata::WorkspaceMetadata;
use crate::paths::{resolve_workspace_root, EnvironmentPaths, WorkspacePaths};

/// Environment variable that selects the workspace root, e.g. `COMFYGIT_HOME`.
pub const WORKSPACE_ENV_VAR: &str = "COMFYGIT_HOME";
/// Default workspace directory name, joined with the user's home directory.
pub const DEFAULT_WORKSPACE_DIR_NAME: &str = ".comfygit";

/// A workspace: the root holding every environment, the shared model pool,
/// the node archive cache, and `workspace.json`.
///
/// This is one of the two pieces of process-wide state the core recognizes
/// (the other being the model index handle); both are explicitly constructed
/// and passed into operations rather than exposed as singletons.
#[derive(Debug, Clone)]
pub struct Workspace {
    paths: WorkspacePaths,
    metadata: WorkspaceMetadata,
}

impl Workspace {
    /// Resolves the workspace root from the environment, then loads it.
    pub fn discover() -> CoreResult<Self> {
        let root = resolve_workspace_root(WORKSPACE_ENV_VAR, DEFAULT_WORKSPACE_DIR_NAME)
            .ok_or_else(|| CoreError::WorkspaceNotFound {
                path: PathBuf::from(DEFAULT_WORKSPACE_DIR_NAME),
            })?;
        Self::load(root)
    }

    /// Loads an existing workspace from an explicit root.
    pub fn load(root: impl Into<PathBuf>) -> CoreResult<Self> {
        let paths = WorkspacePaths::new(root);
        if !paths.metadata_file().exists() {
            return Err(CoreError::WorkspaceNotFound {
                path: paths.root().to_path_buf(),
            });
        }
        let metadata = WorkspaceMetadata::load(&paths.metadata_file())?;
        Ok(Self { paths, metadata })
    }

    /// Creates a brand-new workspace at `root`. Idempotent: calling this on
    /// an already-initialized workspace just reloads it.
    pub fn create(root: impl Into<PathBuf>) -> CoreResult<Self> {
        let paths = WorkspacePaths::new(root);
        if paths.metadata_file().exists() {
            debug!(root = ?paths.root(), "workspace already initialized");
            return Self::load(paths.root().to_path_buf());
        }

        fs_err::create_dir_all(paths.environments_dir())
            .map_err(|e| CoreError::io(paths.environments_dir(), e))?;
        fs_err::create_dir_all(paths.default_models_pool())
            .map_err(|e| CoreError::io(paths.default_models_pool(), e))?;
        fs_err::create_dir_all(paths.node_cache_dir())
            .map_err(|e| CoreError::io(paths.node_cache_dir(), e))?;
        fs_err::create_dir_all(paths.comfyui_cache_dir())
            .map_err(|e| CoreError::io(paths.comfyui_cache_dir(), e))?;
        fs_err::create_dir_all(paths.api_cache_dir())
            .map_err(|e| CoreError::io(paths.api_cache_dir(), e))?;

        let metadata = WorkspaceMetadata::default();
        metadata.save(&paths.metadata_file())?;

        Ok(Self { paths, metadata })
    }

    pub fn paths(&self) -> &WorkspacePaths {
        &self.paths
    }

    pub fn metadata(&self) -> &WorkspaceMetadata {
        &self.metadata
    }

    /// Persists any in-memory metadata changes back to `workspace.json`.
    fn save_metadata(&self) -> CoreResult<()> {
        self.metadata.save(&self.paths.metadata_file())
    }

    pub fn active_environment_name(&self) -> Option<&str> {
        self.metadata.active_environment.as_deref()
    }

    pub fn set_active_environment(&mut self, name: &str) -> CoreResult<()> {
        if !self.environment_exists(name) {
            return Err(CoreError::UnknownEnvironment {
                name: name.to_string(),
            });
        }
        self.metadata.active_environment = Some(name.to_string());
        self.save_metadata()
    }

    pub fn environment_exists(&self, name: &str) -> bool {
        self.paths.environment_dir(name).is_dir()
    }

    pub fn list_environments(&self) -> CoreResult<Vec<String>> {
        let dir = self.paths.environments_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs_err::read_dir(&dir).map_err(|e| CoreError::io(&dir, e))? {
            let entry = entry.map_err(|e| CoreError::io(&dir, e))?;
            if entry.path().is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Resolves an environment by name, defaulting to the active one when
    /// `name` is `None`.
    pub fn resolve_environment(&self, name: Option<&str>) -> CoreResult<Environment> {
        let name = match name {
            Some(n) => n.to_string(),
            None => self
                .active_environment_name()
                .ok_or(CoreError::NoActiveEnvironment)?
                .to_string(),
        };
        if !self.environment_exists(&name) {
            return Err(CoreError::UnknownEnvironment { name });
        }
        let dir = self.paths.environment_dir(&name);
        Ok(Environment::new(name, dir))
    }

    /// Creates a new environment directory skeleton and records nothing in
    /// `workspace.json` beyond what already exists — an environment is
    /// addressable purely by its directory name.
    pub fn create_environment(&self, name: &str) -> CoreResult<Environment> {
        let dir = self.paths.environment_dir(name);
        if dir.exists() {
            return Err(CoreError::ManifestConflict(format!(
                "environment `{name}` already exists"
            )));
        }
        let env_paths = EnvironmentPaths::new(dir);
        for p in [
            env_paths.comfyui_dir(),
            env_paths.custom_nodes_dir(),
            env_paths.comfyui_workflows_dir(),
            env_paths.cec_dir(),
            env_paths.workflows_mirror_dir(),
            env_paths.dev_nodes_dir(),
        ] {
            fs_err::create_dir_all(&p).map_err(|e| CoreError::io(&p, e))?;
        }
        Ok(Environment::new(name.to_string(), env_paths.root().to_path_buf()))
    }
}

/// A single named environment inside a workspace.
#[derive(Debug, Clone)]
pub struct Environment {
    name: String,
    paths: EnvironmentPaths,
}

impl Environment {
    pub fn new(name: String, root: PathBuf) -> Self {
        Self {
            name,
            paths: EnvironmentPaths::new(root),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn paths(&self) -> &EnvironmentPaths {
        &self.paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let ws1 = Workspace::create(dir.path().to_path_buf()).unwrap();
        let ws2 = Workspace::create(dir.path().to_path_buf()).unwrap();
        assert_eq!(ws1.paths().root(), ws2.paths().root());
    }

    #[test]
    fn set_active_rejects_unknown_environment() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = Workspace::create(dir.path().to_path_buf()).unwrap();
        let err = ws.set_active_environment("nope").unwrap_err();
        assert!(matches!(err, CoreError::UnknownEnvironment { .. }));
    }

    #[test]
    fn create_environment_scaffolds_directories() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::create(dir.path().to_path_buf()).unwrap();
        let env = ws.create_environment("default").unwrap();
        assert!(env.paths().cec_dir().is_dir());
        assert!(env.paths().dev_nodes_dir().is_dir());
        assert!(ws.environment_exists("default"));
    }
}
