//! Git-backed versioning for `.cec/`: commit/tag on every reconciliation,
//! rollback to any prior `vN`, and remote push/pull primitives. Does not
//! depend on node or Python collaborators; the reconcile-then-commit-or-
//! revert pipeline around `pull()` is composed one layer up.

pub mod error;
pub mod git_ops;
pub mod snapshot;
pub mod tags;

pub use error::{GitError, GitResult};
pub use snapshot::{GitSnapshotManager, PullOutcome, RollbackOutcome};
pub use tags::{next_tag, parse_tag};
