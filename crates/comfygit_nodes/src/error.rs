use std::path::PathBuf;

use thiserror::Error;

use crate::conflict::NodeDirectoryConflict;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Manifest(#[from] comfygit_manifest::ManifestError),

    #[error(transparent)]
    External(#[from] comfygit_external::ExternalError),

    #[error("`{0}` is not a recognized package identifier, VCS URL, or local directory")]
    UnparseableIdentifier(String),

    #[error("git executable not found on PATH")]
    GitNotFound,

    #[error("git command failed: {command}")]
    GitCommand { command: String, stderr: String },

    #[error("installing `{package_id}` into `{path}` conflicts with an existing directory ({conflict:?})")]
    Conflict { package_id: String, path: PathBuf, conflict: NodeDirectoryConflict },

    #[error("no archive available for `{package_id}@{reference}` and no git fallback was possible")]
    NoAcquisitionSource { package_id: String, reference: String },

    #[error("failed to extract archive for `{package_id}`")]
    Archive {
        package_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{package_id}` is not installed")]
    NotInstalled { package_id: String },

    #[error("dependency resolution for group `{group}` failed: {message}")]
    ResolutionFailed { group: String, message: String },
}

pub type NodeResult<T> = Result<T, NodeError>;
