use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Manifest(#[from] comfygit_manifest::ManifestError),

    #[error(transparent)]
    Git(#[from] comfygit_git::GitError),

    #[error(transparent)]
    Workflow(#[from] comfygit_workflow::WorkflowError),

    #[error(transparent)]
    Python(#[from] comfygit_python::PythonError),

    #[error(transparent)]
    Reconcile(#[from] comfygit_reconcile::ReconcileError),

    #[error(transparent)]
    Workspace(#[from] comfygit_workspace::CoreError),

    #[error("the environment has uncommitted changes; commit or discard them before exporting")]
    UncommittedChanges,

    #[error("{count} model(s) have no recorded source URL and cannot be reacquired on import: {names:?}")]
    MissingModelSources { count: usize, names: Vec<String> },
}

pub type ImportExportResult<T> = Result<T, ImportExportError>;
