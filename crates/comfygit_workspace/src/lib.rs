//! Workspace and environment data model.
//!
//! Holds the on-disk layout (paths), the `workspace.json` metadata record,
//! and the shared [`CoreError`] type every other `comfygit_*` crate returns.
//! Everything here is leaf-level: no dependency on the manifest, the model
//! index, or any of the managers.

pub mod error;
pub mod metadata;
pub mod model_link;
pub mod paths;
pub mod workspace;

pub use error::{CoreError, CoreResult, ErrorClass};
pub use metadata::{GlobalModelDirectory, WorkspaceMetadata};
pub use model_link::ModelLink;
pub use paths::{EnvironmentPaths, WorkspacePaths};
pub use workspace::{Environment, Workspace, DEFAULT_WORKSPACE_DIR_NAME, WORKSPACE_ENV_VAR};
