use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Workflow(#[from] comfygit_workflow::WorkflowError),

    #[error("git executable not found on PATH")]
    GitNotFound,

    #[error("git command failed: {command}")]
    GitCommand { command: String, stderr: String },

    #[error("refusing to proceed: uncommitted changes in `.cec/`")]
    UncommittedChanges,

    #[error("unknown version tag `{tag}`")]
    UnknownTag { tag: String },

    #[error("push rejected: remote is not a fast-forward of the local branch")]
    NonFastForward,
}

pub type GitResult<T> = Result<T, GitError>;
