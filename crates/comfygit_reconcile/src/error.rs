use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Manifest(#[from] comfygit_manifest::ManifestError),

    #[error(transparent)]
    Node(#[from] comfygit_nodes::NodeError),

    #[error(transparent)]
    Python(#[from] comfygit_python::PythonError),

    #[error(transparent)]
    Git(#[from] comfygit_git::GitError),

    #[error(transparent)]
    Workflow(#[from] comfygit_workflow::WorkflowError),

    #[error(transparent)]
    External(#[from] comfygit_external::ExternalError),

    #[error(transparent)]
    ModelIndex(#[from] comfygit_model_index::ModelIndexError),

    #[error(transparent)]
    Workspace(#[from] comfygit_workspace::CoreError),

    #[error(transparent)]
    Resolution(#[from] comfygit_resolution::ResolutionError),

    #[error("reconciliation aborted: every node mutation in this pass failed")]
    AllNodeMutationsFailed,
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;
