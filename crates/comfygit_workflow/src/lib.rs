//! Parses workflow JSON (including subgraphs) into the set of custom node
//! types and model references a workflow depends on, without ever mutating
//! the document itself.

mod analyzer;
mod builtin;
mod cache;
mod document;
mod error;
mod extract;
mod flatten;
mod mirror;
mod model;
mod normalize;

pub use analyzer::analyze;
pub use builtin::{is_builtin, loader_widgets, LoaderWidget};
pub use cache::AnalyzerCache;
pub use document::WorkflowDocument;
pub use error::{WorkflowError, WorkflowResult};
pub use extract::classify;
pub use flatten::flatten;
pub use mirror::{mirror_workflows, MirrorOutcome};
pub use model::{AnalysisResult, FlatNode, ModelReference, NodeClass};
pub use normalize::{content_hash, normalize_for_hash, NORMALIZED_AWAY_POINTERS};
