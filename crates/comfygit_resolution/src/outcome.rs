use serde::{Deserialize, Serialize};

/// Tagged outcome of resolving one item (a node type or a model reference).
/// Mirrors §9's "dynamic typing → sum types" design note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Resolution<T> {
    Resolved { value: T, auto_resolved: bool },
    Ambiguous { candidates: Vec<T> },
    Unresolved { reason: String },
    Optional,
}

impl<T> Resolution<T> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }

    pub fn is_blocking(&self) -> bool {
        !matches!(self, Resolution::Resolved { .. } | Resolution::Optional)
    }
}

/// What a user (or scripted) strategy decided for one node type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeUserDecision {
    SelectPackage(String),
    ManualIdentifier(String),
    Optional,
    Skip,
}

/// What a user (or scripted) strategy decided for one model reference.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelUserDecision {
    Select(String),
    ProvideUrl { url: String, source_type: String },
    Optional,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchTier {
    High,
    Good,
    Possible,
}

impl MatchTier {
    pub fn from_score(score: f64) -> Option<Self> {
        if score > 0.8 {
            Some(MatchTier::High)
        } else if score > 0.6 {
            Some(MatchTier::Good)
        } else if score > 0.4 {
            Some(MatchTier::Possible)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCandidate {
    pub relative_path: String,
    pub hash: String,
    pub score: f64,
    pub tier: MatchTier,
}
