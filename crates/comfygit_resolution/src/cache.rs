//! Per-workflow resolution result cache, keyed by
//! `(workflow_content_hash, manifest_slice_hash, index_subset_hash)` so
//! unrelated manifest or index edits don't invalidate an unaffected
//! workflow's cached resolution (§4.4 Caching).

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::ResolutionResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResolutionSnapshot {
    pub node_resolutions: Vec<(String, String)>,
    pub model_resolutions: Vec<(String, String)>,
}

pub struct ResolutionCacheKey {
    pub workflow_content_hash: String,
    pub manifest_slice_hash: String,
    pub index_subset_hash: String,
}

impl ResolutionCacheKey {
    fn composite(&self) -> String {
        format!("{}:{}:{}", self.workflow_content_hash, self.manifest_slice_hash, self.index_subset_hash)
    }
}

pub struct ResolutionCache {
    conn: Connection,
}

impl ResolutionCache {
    pub fn open(path: &Path) -> ResolutionResult<Self> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::migrate(&conn)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> ResolutionResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::migrate(&conn)?;
        Ok(Self { conn })
    }

    fn migrate(conn: &Connection) -> ResolutionResult<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS resolution_cache (
                cache_key TEXT PRIMARY KEY,
                snapshot_json TEXT NOT NULL,
                cached_at TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    pub fn get(&self, key: &ResolutionCacheKey) -> ResolutionResult<Option<WorkflowResolutionSnapshot>> {
        let row: Option<String> = self
            .conn
            .query_row(
                "SELECT snapshot_json FROM resolution_cache WHERE cache_key = ?1",
                params![key.composite()],
                |r| r.get(0),
            )
            .optional()?;
        Ok(row.map(|j| serde_json::from_str(&j)).transpose()?)
    }

    pub fn put(&self, key: &ResolutionCacheKey, snapshot: &WorkflowResolutionSnapshot) -> ResolutionResult<()> {
        let json = serde_json::to_string(snapshot)?;
        self.conn.execute(
            "INSERT INTO resolution_cache (cache_key, snapshot_json, cached_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(cache_key) DO UPDATE SET snapshot_json = excluded.snapshot_json, cached_at = excluded.cached_at",
            params![key.composite(), json],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrelated_manifest_slice_hash_misses_cache() {
        let cache = ResolutionCache::open_in_memory().unwrap();
        let key_a = ResolutionCacheKey {
            workflow_content_hash: "wf1".into(),
            manifest_slice_hash: "slice1".into(),
            index_subset_hash: "idx1".into(),
        };
        cache
            .put(&key_a, &WorkflowResolutionSnapshot { node_resolutions: vec![], model_resolutions: vec![] })
            .unwrap();

        let key_b = ResolutionCacheKey {
            workflow_content_hash: "wf1".into(),
            manifest_slice_hash: "slice2".into(),
            index_subset_hash: "idx1".into(),
        };
        assert!(cache.get(&key_b).unwrap().is_none());
        assert!(cache.get(&key_a).unwrap().is_some());
    }
}
