//! Resolves a workflow's custom node types to manifest packages and its
//! model references to indexed files, persisting each decision as it's made.

mod cache;
mod error;
mod model_resolver;
mod node_resolver;
mod outcome;
mod persistence;

pub use cache::{ResolutionCache, ResolutionCacheKey, WorkflowResolutionSnapshot};
pub use error::{ResolutionError, ResolutionResult};
pub use model_resolver::{
    longest_common_substring_ratio, resolve_model_reference, AutoModelStrategy, ModelUserStrategy, ResolvedModel,
};
pub use node_resolver::{resolve_node_type, AutoNodeStrategy, NodeMatcher, NodeRegistryLookup, NodeUserStrategy, StrsimNodeMatcher};
pub use outcome::{MatchTier, ModelCandidate, ModelUserDecision, NodeUserDecision, Resolution};
pub use persistence::{persist_model_resolution, persist_node_resolution};
