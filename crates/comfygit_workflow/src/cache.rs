//! SQLite-backed cache of [`AnalysisResult`] keyed by the workflow's content
//! hash, so re-analyzing an unchanged workflow is a row lookup and a
//! deserialize instead of a re-parse.

use std::path::Path;

use comfygit_consts::WORKFLOW_CACHE_SCHEMA_VERSION;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::WorkflowResult;
use crate::model::AnalysisResult;

pub struct AnalyzerCache {
    conn: Connection,
}

impl AnalyzerCache {
    pub fn open(path: &Path) -> WorkflowResult<Self> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent).map_err(|e| crate::error::WorkflowError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::migrate(&conn)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> WorkflowResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::migrate(&conn)?;
        Ok(Self { conn })
    }

    fn migrate(conn: &Connection) -> WorkflowResult<()> {
        conn.execute_batch(&format!(
            "
            CREATE TABLE IF NOT EXISTS schema_info (version INTEGER NOT NULL);
            CREATE TABLE IF NOT EXISTS analyzer_cache (
                content_hash TEXT PRIMARY KEY,
                result_json TEXT NOT NULL,
                cached_at TEXT NOT NULL
            );
            INSERT INTO schema_info (version)
                SELECT {v} WHERE NOT EXISTS (SELECT 1 FROM schema_info);
            ",
            v = WORKFLOW_CACHE_SCHEMA_VERSION
        ))?;
        Ok(())
    }

    pub fn get(&self, content_hash: &str) -> WorkflowResult<Option<AnalysisResult>> {
        let row: Option<String> = self
            .conn
            .query_row(
                "SELECT result_json FROM analyzer_cache WHERE content_hash = ?1",
                params![content_hash],
                |r| r.get(0),
            )
            .optional()?;
        Ok(row.map(|json| serde_json::from_str(&json)).transpose()?)
    }

    pub fn put(&self, result: &AnalysisResult) -> WorkflowResult<()> {
        let json = serde_json::to_string(result)?;
        self.conn.execute(
            "INSERT INTO analyzer_cache (content_hash, result_json, cached_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(content_hash) DO UPDATE SET result_json = excluded.result_json, cached_at = excluded.cached_at",
            params![result.content_hash, json],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelReference;

    #[test]
    fn cache_hit_returns_deserialized_result() {
        let cache = AnalyzerCache::open_in_memory().unwrap();
        let result = AnalysisResult {
            content_hash: "abc123".into(),
            custom_node_types: vec!["Foo".into()],
            model_references: vec![ModelReference {
                node_id: "1".into(),
                node_type: "Foo".into(),
                widget_index: 0,
                widget_value: "bar.safetensors".into(),
            }],
        };
        cache.put(&result).unwrap();
        let fetched = cache.get("abc123").unwrap().unwrap();
        assert_eq!(fetched.custom_node_types, result.custom_node_types);
    }

    #[test]
    fn cache_miss_returns_none() {
        let cache = AnalyzerCache::open_in_memory().unwrap();
        assert!(cache.get("nonexistent").unwrap().is_none());
    }
}
