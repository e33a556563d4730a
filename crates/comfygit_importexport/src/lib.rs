//! Portable environment archives (§4.10): `export` packages a committed
//! environment's declarative state into a gzip tar; `import` unpacks one
//! (or clones a git-hosted one) into a fresh environment and runs it
//! through the same collaborators the reconciler uses.

mod archive;
mod error;
mod export;
mod import;

pub use error::{ImportExportError, ImportExportResult};
pub use export::{export, ExportReport};
pub use import::{import, ImportOptions, ImportReport, ImportSource};
