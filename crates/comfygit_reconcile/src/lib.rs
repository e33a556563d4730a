//! Ties the manifest to the filesystem and Python environment: the
//! reconciliation pipeline run on every creation, pull, rollback, import,
//! and explicit sync, plus the commit safety predicate that gates whether a
//! snapshot is allowed to be taken at all.

pub mod commit_safety;
pub mod error;
pub mod models;
pub mod nodes;
pub mod pipeline;
pub mod workflows;

pub use commit_safety::{blocking_issue, is_safe_to_commit};
pub use error::{ReconcileError, ReconcileResult};
pub use models::{acquire_models, BlockingDownloader, ModelAcquisitionReport, ModelAcquisitionStrategy};
pub use nodes::{reconcile_nodes, NodeReconcileReport};
pub use pipeline::{reconcile, ReconcileReport};
pub use workflows::{track_workflows, WorkflowTrackingReport};
