use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row from `models`, identified by its quick hash (as hex).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedModel {
    pub hash: String,
    pub file_size: u64,
    pub blake3_hash: Option<String>,
    pub sha256_hash: Option<String>,
    pub indexed_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub locations: Vec<ModelLocation>,
}

impl IndexedModel {
    /// First path segment of any surviving location's `relative_path`.
    pub fn category(&self) -> Option<&str> {
        self.locations.first().and_then(|l| category_of(&l.relative_path))
    }
}

/// A row from `model_locations`: one physical path that currently (or, until
/// the last sync, recently) held this model's bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelLocation {
    pub relative_path: String,
    pub filename: String,
    pub size: u64,
    pub mtime: i64,
    pub last_seen: DateTime<Utc>,
}

/// A row from `model_sources`: a known download URL for re-acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSource {
    pub source_type: String,
    pub source_url: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub unique_models: u64,
    pub total_locations: u64,
    pub duplicates: u64,
}

/// First path segment of a pool-relative path, e.g. `checkpoints` from
/// `checkpoints/sd15/v1.safetensors`. There is no stored category column;
/// it is always derived from the path.
pub fn category_of(relative_path: &str) -> Option<&str> {
    relative_path.split('/').next().filter(|s| !s.is_empty())
}
