//! The CLI's own aggregate error. `comfygit_workspace::CoreError` already
//! classifies workspace/path failures into `ErrorClass`; every other
//! `comfygit_*` crate has its own scoped error enum with no workspace
//! dependency (workspace sits at the bottom of the dependency graph and
//! can't reach upward to wrap them). This is where those per-crate errors
//! finally meet, so this is where the full `ErrorClass` classification has
//! to live.

use comfygit_workspace::ErrorClass;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Workspace(#[from] comfygit_workspace::CoreError),

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
    Reconcile(#[from] comfygit_reconcile::ReconcileError),

    #[error(transparent)]
    ImportExport(#[from] comfygit_importexport::ImportExportError),

    #[error("{0}")]
    Usage(String),
}

impl CliError {
    pub fn class(&self) -> ErrorClass {
        match self {
            CliError::Workspace(e) => e.class(),
            CliError::Manifest(_) => ErrorClass::UserInput,
            CliError::Node(e) => node_error_class(e),
            CliError::Python(e) => python_error_class(e),
            CliError::Git(e) => git_error_class(e),
            CliError::Workflow(_) => ErrorClass::UserInput,
            CliError::External(_) => ErrorClass::External,
            CliError::ModelIndex(_) => ErrorClass::State,
            CliError::Reconcile(e) => reconcile_error_class(e),
            CliError::ImportExport(e) => importexport_error_class(e),
            CliError::Usage(_) => ErrorClass::UserInput,
        }
    }
}

fn node_error_class(err: &comfygit_nodes::NodeError) -> ErrorClass {
    use comfygit_nodes::NodeError::*;
    match err {
        Io(_) => ErrorClass::State,
        Manifest(_) => ErrorClass::UserInput,
        External(_) => ErrorClass::External,
        UnparseableIdentifier(_) => ErrorClass::UserInput,
        GitNotFound | GitCommand { .. } => ErrorClass::External,
        Conflict { .. } => ErrorClass::UserInput,
        NoAcquisitionSource { .. } => ErrorClass::External,
        Archive { .. } => ErrorClass::External,
        NotInstalled { .. } => ErrorClass::UserInput,
        ResolutionFailed { .. } => ErrorClass::UserInput,
    }
}

fn python_error_class(err: &comfygit_python::PythonError) -> ErrorClass {
    use comfygit_python::PythonError::*;
    match err {
        Io(_) => ErrorClass::State,
        Manifest(_) => ErrorClass::UserInput,
        UvNotFound | UvCommand { .. } | UvOutput { .. } => ErrorClass::External,
        Resolution(_) => ErrorClass::UserInput,
        VenvMissing { .. } => ErrorClass::State,
    }
}

fn git_error_class(err: &comfygit_git::GitError) -> ErrorClass {
    use comfygit_git::GitError::*;
    match err {
        Io(_) => ErrorClass::State,
        Workflow(_) => ErrorClass::UserInput,
        GitNotFound | GitCommand { .. } => ErrorClass::External,
        UncommittedChanges => ErrorClass::UserInput,
        UnknownTag { .. } => ErrorClass::UserInput,
        NonFastForward => ErrorClass::External,
    }
}

fn reconcile_error_class(err: &comfygit_reconcile::ReconcileError) -> ErrorClass {
    use comfygit_reconcile::ReconcileError::*;
    match err {
        Io(_) => ErrorClass::State,
        Manifest(_) => ErrorClass::UserInput,
        Node(e) => node_error_class(e),
        Python(e) => python_error_class(e),
        Git(e) => git_error_class(e),
        Workflow(_) => ErrorClass::UserInput,
        External(_) => ErrorClass::External,
        ModelIndex(_) => ErrorClass::State,
        Workspace(e) => e.class(),
        Resolution(_) => ErrorClass::UserInput,
        AllNodeMutationsFailed => ErrorClass::External,
    }
}

fn importexport_error_class(err: &comfygit_importexport::ImportExportError) -> ErrorClass {
    use comfygit_importexport::ImportExportError::*;
    match err {
        Io(_) => ErrorClass::State,
        Manifest(_) => ErrorClass::UserInput,
        Git(e) => git_error_class(e),
        Workflow(_) => ErrorClass::UserInput,
        Python(e) => python_error_class(e),
        Reconcile(e) => reconcile_error_class(e),
        Workspace(e) => e.class(),
        UncommittedChanges => ErrorClass::UserInput,
        MissingModelSources { .. } => ErrorClass::UserInput,
    }
}

pub type CliResult<T> = Result<T, CliError>;
