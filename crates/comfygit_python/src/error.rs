use std::path::PathBuf;

use thiserror::Error;

use crate::resolution::ResolutionConflict;

#[derive(Debug, Error)]
pub enum PythonError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Manifest(#[from] comfygit_manifest::ManifestError),

    #[error("uv executable not found on PATH")]
    UvNotFound,

    #[error("uv command failed: {command}")]
    UvCommand { command: String, stderr: String },

    #[error("could not parse uv output for `{command}`")]
    UvOutput {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("dependency resolution failed: {0}")]
    Resolution(ResolutionConflict),

    #[error("no venv at {path}; run ensure() first")]
    VenvMissing { path: PathBuf },
}

pub type PythonResult<T> = Result<T, PythonError>;
