//! Connection setup and schema migrations for the model index database.
//!
//! Mirrors the sqlite cache pattern used elsewhere in this codebase: WAL
//! journaling for concurrent readers, a relaxed synchronous mode since the
//! index can always be rebuilt by a full `sync()`, and a busy timeout so
//! concurrent CLI invocations wait rather than fail outright.

use std::path::Path;
use std::time::Duration;

use comfygit_consts::MODEL_INDEX_SCHEMA_VERSION;
use rusqlite::Connection;

use crate::error::{ModelIndexError, ModelIndexResult};

pub fn open(path: &Path) -> ModelIndexResult<Connection> {
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent).map_err(|e| ModelIndexError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    migrate(&conn)?;
    Ok(conn)
}

/// Opens a private in-memory database, used by tests that don't want a file
/// on disk.
pub fn open_in_memory() -> ModelIndexResult<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", true)?;
    migrate(&conn)?;
    Ok(conn)
}

/// Applies every migration step between the database's current
/// `schema_info.version` and [`MODEL_INDEX_SCHEMA_VERSION`]. Each step is
/// idempotent and runs inside its own transaction so an interrupted upgrade
/// can always be rerun from where it left off.
fn migrate(conn: &Connection) -> ModelIndexResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_info (version INTEGER NOT NULL);",
    )?;
    let current: Option<u32> = conn
        .query_row("SELECT version FROM schema_info LIMIT 1", [], |row| row.get(0))
        .ok();

    let mut version = current.unwrap_or(0);
    if version > MODEL_INDEX_SCHEMA_VERSION {
        return Err(ModelIndexError::UnsupportedSchema {
            found: version,
            max_known: MODEL_INDEX_SCHEMA_VERSION,
        });
    }

    if version < 1 {
        migrate_to_v1(conn)?;
        version = 1;
    }

    conn.execute("DELETE FROM schema_info", [])?;
    conn.execute("INSERT INTO schema_info (version) VALUES (?1)", [version])?;
    Ok(())
}

fn migrate_to_v1(conn: &Connection) -> ModelIndexResult<()> {
    conn.execute_batch(
        "
        BEGIN;

        CREATE TABLE IF NOT EXISTS models (
            hash TEXT PRIMARY KEY,
            file_size INTEGER NOT NULL,
            blake3_hash TEXT,
            sha256_hash TEXT,
            metadata TEXT NOT NULL DEFAULT '{}',
            indexed_at TEXT NOT NULL,
            last_modified TEXT NOT NULL
        );

        -- `size` is not in the spec's table listing but is required by its
        -- own sync algorithm ("compare (relative_path, mtime, size)");
        -- tracked here as a per-location cache of the OS file size so sync
        -- can skip re-hashing unchanged files without re-reading `models`.
        CREATE TABLE IF NOT EXISTS model_locations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            model_hash TEXT NOT NULL REFERENCES models(hash) ON DELETE CASCADE,
            relative_path TEXT NOT NULL UNIQUE,
            filename TEXT NOT NULL,
            size INTEGER NOT NULL,
            mtime INTEGER NOT NULL,
            last_seen TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_model_locations_hash ON model_locations(model_hash);
        CREATE INDEX IF NOT EXISTS idx_model_locations_filename ON model_locations(filename);

        CREATE TABLE IF NOT EXISTS model_sources (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            model_hash TEXT NOT NULL REFERENCES models(hash) ON DELETE CASCADE,
            source_type TEXT NOT NULL,
            source_url TEXT NOT NULL,
            added_at TEXT NOT NULL,
            UNIQUE(model_hash, source_url)
        );

        COMMIT;
        ",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_is_idempotent() {
        let conn = open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let version: u32 = conn
            .query_row("SELECT version FROM schema_info", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, MODEL_INDEX_SCHEMA_VERSION);
    }
}
