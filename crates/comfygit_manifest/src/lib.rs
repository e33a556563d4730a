//! Typed reader/writer for the declarative `.cec/pyproject.toml` manifest.
//!
//! [`Manifest`] is the only thing in this crate that touches the TOML
//! document; everything else is plain data ([`model`]) handed back from its
//! typed accessors. Comments and key order survive every mutation because we
//! never deserialize-then-reserialize: all edits go through `toml_edit`'s
//! mutable document model.

pub mod document;
pub mod error;
pub mod manifest;
pub mod model;

pub use error::{ManifestError, ManifestResult};
pub use manifest::Manifest;
pub use model::*;
