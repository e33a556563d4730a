use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// The exit-code class an error belongs to, per the CLI contract in the spec's
/// external-interfaces section. The CLI layer (out of scope here) maps these
/// to process exit codes; the core only needs to classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad arguments, unresolved state blocking a commit without an override.
    UserInput,
    /// Missing workspace, no active environment.
    State,
    /// Network, VCS, archive extraction, timeout.
    External,
    /// A bug: an invariant the core itself is supposed to uphold was violated.
    Internal,
}

impl ErrorClass {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorClass::UserInput => 1,
            ErrorClass::State => 2,
            ErrorClass::External => 3,
            ErrorClass::Internal => 4,
        }
    }
}

/// The error type shared across every `comfygit_*` crate.
#[derive(Error, Debug, Diagnostic)]
pub enum CoreError {
    #[error("workspace not found at `{path}`")]
    WorkspaceNotFound { path: PathBuf },

    #[error("unknown environment `{name}`")]
    UnknownEnvironment { name: String },

    #[error("no active environment is set; pass `--environment` or set one first")]
    NoActiveEnvironment,

    #[error("manifest schema violation: {0}")]
    ManifestSchema(String),

    #[error("conflicting manifest edits: {0}")]
    ManifestConflict(String),

    #[error("internal invariant violated: {0}")]
    Internal(String),

    #[error("io error at `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CoreError {
    pub fn class(&self) -> ErrorClass {
        use CoreError::*;
        match self {
            WorkspaceNotFound { .. } | NoActiveEnvironment => ErrorClass::State,
            UnknownEnvironment { .. } | ManifestSchema(_) | ManifestConflict(_) => ErrorClass::UserInput,
            Internal(_) => ErrorClass::Internal,
            Io { .. } => ErrorClass::State,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CoreError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
