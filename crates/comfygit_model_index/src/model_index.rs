use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use comfygit_consts::DEFAULT_WORKER_POOL_SIZE;
use rayon::ThreadPoolBuilder;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::db;
use crate::error::{ModelIndexError, ModelIndexResult};
use crate::hash::{blake3_hash_file, quick_hash_file, sha256_hash_file};
use crate::types::{IndexStats, IndexedModel, ModelLocation, ModelSource};

/// Result of a [`ModelIndex::sync`] pass.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub hashed: usize,
    pub unchanged: usize,
    pub pruned_locations: usize,
    pub pruned_models: usize,
    pub unreadable: Vec<PathBuf>,
}

/// The workspace-wide content-addressable model catalog.
///
/// Wraps a single SQLite connection behind a mutex: every write is a short
/// transaction, matching the "short transactions, WAL mode" guidance for
/// this shared resource.
pub struct ModelIndex {
    conn: Mutex<Connection>,
    models_dir: PathBuf,
    worker_pool_size: usize,
}

impl ModelIndex {
    pub fn open(db_path: &Path, models_dir: PathBuf) -> ModelIndexResult<Self> {
        let conn = db::open(db_path)?;
        Ok(Self {
            conn: Mutex::new(conn),
            models_dir,
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
        })
    }

    #[cfg(test)]
    pub fn open_in_memory(models_dir: PathBuf) -> ModelIndexResult<Self> {
        let conn = db::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
            models_dir,
            worker_pool_size: 1,
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn with_worker_pool_size(mut self, size: usize) -> Self {
        self.worker_pool_size = size.max(1);
        self
    }

    /// Validates and switches the directory being indexed, then performs a
    /// full scan. Persisting the new directory into `workspace.json` is the
    /// caller's responsibility (this type only owns the SQLite catalog).
    pub fn set_directory(&mut self, path: PathBuf) -> ModelIndexResult<SyncReport> {
        if !path.is_dir() {
            return Err(ModelIndexError::NotADirectory { path });
        }
        self.models_dir = path;
        self.sync(true)
    }

    /// Incremental sync: compares `(relative_path, mtime, size)` against
    /// `model_locations`, re-hashing only new or changed files, and pruning
    /// rows for paths no longer on disk. When `force_rehash` is set every
    /// file is treated as changed (used for `set_directory`'s initial scan
    /// and for manual re-indexing after suspected corruption).
    pub fn sync(&self, force_rehash: bool) -> ModelIndexResult<SyncReport> {
        let mut report = SyncReport::default();

        // Step 1: scan. Collected up front so a partial scan never leaves a
        // half-applied transaction: we either have the whole listing or we
        // bail out before writing anything.
        let entries = scan_directory(&self.models_dir, &mut report.unreadable);

        let conn = self.conn.lock().expect("model index connection poisoned");

        // Step 2: diff against the known locations.
        let mut known: HashMap<String, (i64, u64, String)> = HashMap::new();
        {
            let mut stmt = conn.prepare(
                "SELECT relative_path, mtime, size, model_hash FROM model_locations",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)? as u64,
                    row.get::<_, String>(3)?,
                ))
            })?;
            for row in rows {
                let (rel, mtime, size, hash) = row?;
                known.insert(rel, (mtime, size, hash));
            }
        }

        let seen_paths: HashSet<String> = entries.iter().map(|e| e.relative_path.clone()).collect();

        let to_hash: Vec<&ScannedFile> = entries
            .iter()
            .filter(|e| {
                force_rehash
                    || match known.get(&e.relative_path) {
                        Some((mtime, size, _)) => *mtime != e.mtime || *size != e.size,
                        None => true,
                    }
            })
            .collect();
        report.unchanged = entries.len() - to_hash.len();

        // Hashing is embarrassingly parallel per file; bound it with a
        // dedicated pool rather than spawning unbounded OS threads.
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.worker_pool_size)
            .build()
            .map_err(|e| ModelIndexError::Io {
                path: self.models_dir.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
            })?;
        let hashed: Vec<(ScannedFile, crate::hash::QuickHash)> = pool.install(|| {
            use rayon::prelude::*;
            to_hash
                .par_iter()
                .filter_map(|entry| match quick_hash_file(&entry.absolute_path) {
                    Ok((hash, _len)) => Some(((*entry).clone(), hash)),
                    Err(e) => {
                        warn!(path = %entry.absolute_path.display(), error = %e, "skipping unreadable model file");
                        None
                    }
                })
                .collect()
        });
        report.hashed = hashed.len();

        // Step 3: write. A single transaction so a crash mid-sync never
        // leaves orphaned rows.
        let now = Utc::now();
        let tx = conn.unchecked_transaction()?;

        for (entry, hash) in &hashed {
            let hash_hex = hash.to_hex();
            upsert_model(&tx, &hash_hex, entry.size, now)?;
            upsert_location(&tx, &hash_hex, entry, now)?;
        }

        // Paths that still exist but weren't re-hashed: just bump last_seen.
        for entry in entries.iter().filter(|e| !to_hash.iter().any(|h| h.relative_path == e.relative_path)) {
            tx.execute(
                "UPDATE model_locations SET last_seen = ?1 WHERE relative_path = ?2",
                params![now.to_rfc3339(), entry.relative_path],
            )?;
        }

        // Prune locations for paths no longer on disk.
        let mut stale_stmt = tx.prepare("SELECT relative_path FROM model_locations")?;
        let stale: Vec<String> = stale_stmt
            .query_map([], |r| r.get::<_, String>(0))?
            .filter_map(Result::ok)
            .filter(|p| !seen_paths.contains(p))
            .collect();
        drop(stale_stmt);
        for path in &stale {
            tx.execute("DELETE FROM model_locations WHERE relative_path = ?1", params![path])?;
        }
        report.pruned_locations = stale.len();

        // Drop model rows with no surviving location.
        let pruned_models = tx.execute(
            "DELETE FROM models WHERE hash NOT IN (SELECT DISTINCT model_hash FROM model_locations)",
            [],
        )?;
        report.pruned_models = pruned_models;

        tx.commit()?;
        debug!(?report, "model index sync complete");
        Ok(report)
    }

    pub fn find_by_hash(&self, prefix: &str) -> ModelIndexResult<Vec<IndexedModel>> {
        let conn = self.conn.lock().expect("poisoned");
        let mut stmt = conn.prepare("SELECT hash FROM models WHERE hash LIKE ?1 ORDER BY hash")?;
        let pattern = format!("{prefix}%");
        let hashes: Vec<String> = stmt
            .query_map(params![pattern], |r| r.get(0))?
            .collect::<Result<_, _>>()?;
        drop(stmt);
        hashes
            .into_iter()
            .filter_map(|h| self.load_model(&conn, &h).transpose())
            .collect()
    }

    pub fn find_by_filename(&self, substring: &str) -> ModelIndexResult<Vec<IndexedModel>> {
        let conn = self.conn.lock().expect("poisoned");
        let pattern = format!("%{substring}%");
        let mut stmt = conn.prepare(
            "SELECT DISTINCT model_hash FROM model_locations WHERE filename LIKE ?1",
        )?;
        let hashes: Vec<String> = stmt
            .query_map(params![pattern], |r| r.get(0))?
            .collect::<Result<_, _>>()?;
        drop(stmt);
        hashes
            .into_iter()
            .filter_map(|h| self.load_model(&conn, &h).transpose())
            .collect()
    }

    /// Filename OR relative_path LIKE `%term%`.
    pub fn search(&self, term: &str) -> ModelIndexResult<Vec<IndexedModel>> {
        let conn = self.conn.lock().expect("poisoned");
        let pattern = format!("%{term}%");
        let mut stmt = conn.prepare(
            "SELECT DISTINCT model_hash FROM model_locations WHERE filename LIKE ?1 OR relative_path LIKE ?1",
        )?;
        let hashes: Vec<String> = stmt
            .query_map(params![pattern], |r| r.get(0))?
            .collect::<Result<_, _>>()?;
        drop(stmt);
        hashes
            .into_iter()
            .filter_map(|h| self.load_model(&conn, &h).transpose())
            .collect()
    }

    pub fn find_by_exact_path(&self, relative_path: &str) -> ModelIndexResult<Option<IndexedModel>> {
        let conn = self.conn.lock().expect("poisoned");
        let hash: Option<String> = conn
            .query_row(
                "SELECT model_hash FROM model_locations WHERE relative_path = ?1",
                params![relative_path],
                |r| r.get(0),
            )
            .optional()?;
        match hash {
            Some(h) => self.load_model(&conn, &h),
            None => Ok(None),
        }
    }

    pub fn get_by_category(&self, category: &str) -> ModelIndexResult<Vec<IndexedModel>> {
        let conn = self.conn.lock().expect("poisoned");
        let pattern = format!("{category}/%");
        let mut stmt = conn.prepare(
            "SELECT DISTINCT model_hash FROM model_locations WHERE relative_path LIKE ?1",
        )?;
        let hashes: Vec<String> = stmt
            .query_map(params![pattern], |r| r.get(0))?
            .collect::<Result<_, _>>()?;
        drop(stmt);
        hashes
            .into_iter()
            .filter_map(|h| self.load_model(&conn, &h).transpose())
            .collect()
    }

    /// Idempotent on `(hash, url)`.
    pub fn add_source(&self, hash: &str, source_type: &str, url: &str) -> ModelIndexResult<()> {
        let conn = self.conn.lock().expect("poisoned");
        conn.execute(
            "INSERT OR IGNORE INTO model_sources (model_hash, source_type, source_url, added_at) VALUES (?1, ?2, ?3, ?4)",
            params![hash, source_type, url, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Computes and stores the full-file hash for `hash`'s first surviving
    /// location, to be used as a collision tie-breaker.
    pub fn compute_full_hash(&self, hash: &str) -> ModelIndexResult<Option<(String, String)>> {
        let conn = self.conn.lock().expect("poisoned");
        let Some(rel_path): Option<String> = conn
            .query_row(
                "SELECT relative_path FROM model_locations WHERE model_hash = ?1 LIMIT 1",
                params![hash],
                |r| r.get(0),
            )
            .optional()?
        else {
            return Ok(None);
        };
        let abs = self.models_dir.join(&rel_path);
        let blake3 = blake3_hash_file(&abs).map_err(|e| ModelIndexError::Io {
            path: abs.clone(),
            source: e,
        })?;
        let sha256 = sha256_hash_file(&abs).map_err(|e| ModelIndexError::Io { path: abs, source: e })?;
        conn.execute(
            "UPDATE models SET blake3_hash = ?1, sha256_hash = ?2 WHERE hash = ?3",
            params![blake3, sha256, hash],
        )?;
        Ok(Some((blake3, sha256)))
    }

    pub fn stats(&self) -> ModelIndexResult<IndexStats> {
        let conn = self.conn.lock().expect("poisoned");
        let unique_models: u64 = conn.query_row("SELECT COUNT(*) FROM models", [], |r| r.get(0))?;
        let total_locations: u64 =
            conn.query_row("SELECT COUNT(*) FROM model_locations", [], |r| r.get(0))?;
        let duplicates = total_locations.saturating_sub(unique_models);
        Ok(IndexStats {
            unique_models,
            total_locations,
            duplicates,
        })
    }

    fn load_model(&self, conn: &Connection, hash: &str) -> ModelIndexResult<Option<IndexedModel>> {
        let row = conn
            .query_row(
                "SELECT hash, file_size, blake3_hash, sha256_hash, indexed_at, last_modified FROM models WHERE hash = ?1",
                params![hash],
                |r| {
                    Ok((
                        r.get::<_, String>(0)?,
                        r.get::<_, i64>(1)? as u64,
                        r.get::<_, Option<String>>(2)?,
                        r.get::<_, Option<String>>(3)?,
                        r.get::<_, String>(4)?,
                        r.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;
        let Some((hash, file_size, blake3_hash, sha256_hash, indexed_at, last_modified)) = row else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT relative_path, filename, size, mtime, last_seen FROM model_locations WHERE model_hash = ?1 ORDER BY relative_path",
        )?;
        let locations: Vec<ModelLocation> = stmt
            .query_map(params![hash], |r| {
                Ok(ModelLocation {
                    relative_path: r.get(0)?,
                    filename: r.get(1)?,
                    size: r.get::<_, i64>(2)? as u64,
                    mtime: r.get(3)?,
                    last_seen: r
                        .get::<_, String>(4)?
                        .parse()
                        .unwrap_or_else(|_| Utc::now()),
                })
            })?
            .collect::<Result<_, _>>()?;

        Ok(Some(IndexedModel {
            hash,
            file_size,
            blake3_hash,
            sha256_hash,
            indexed_at: indexed_at.parse().unwrap_or_else(|_| Utc::now()),
            last_modified: last_modified.parse().unwrap_or_else(|_| Utc::now()),
            locations,
        }))
    }

    pub fn list_sources(&self, hash: &str) -> ModelIndexResult<Vec<ModelSource>> {
        let conn = self.conn.lock().expect("poisoned");
        let mut stmt = conn.prepare(
            "SELECT source_type, source_url, added_at FROM model_sources WHERE model_hash = ?1",
        )?;
        let out = stmt
            .query_map(params![hash], |r| {
                Ok(ModelSource {
                    source_type: r.get(0)?,
                    source_url: r.get(1)?,
                    added_at: r.get::<_, String>(2)?.parse().unwrap_or_else(|_| Utc::now()),
                })
            })?
            .collect::<Result<_, _>>()?;
        Ok(out)
    }
}

fn upsert_model(conn: &Connection, hash: &str, size: u64, now: chrono::DateTime<Utc>) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO models (hash, file_size, metadata, indexed_at, last_modified)
         VALUES (?1, ?2, '{}', ?3, ?3)
         ON CONFLICT(hash) DO UPDATE SET file_size = excluded.file_size, last_modified = excluded.last_modified",
        params![hash, size as i64, now.to_rfc3339()],
    )?;
    Ok(())
}

fn upsert_location(
    conn: &Connection,
    hash: &str,
    entry: &ScannedFile,
    now: chrono::DateTime<Utc>,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO model_locations (model_hash, relative_path, filename, size, mtime, last_seen)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(relative_path) DO UPDATE SET
            model_hash = excluded.model_hash,
            filename = excluded.filename,
            size = excluded.size,
            mtime = excluded.mtime,
            last_seen = excluded.last_seen",
        params![
            hash,
            entry.relative_path,
            entry.filename,
            entry.size as i64,
            entry.mtime,
            now.to_rfc3339(),
        ],
    )?;
    Ok(())
}

#[derive(Debug, Clone)]
struct ScannedFile {
    absolute_path: PathBuf,
    relative_path: String,
    filename: String,
    size: u64,
    mtime: i64,
}

fn scan_directory(root: &Path, unreadable: &mut Vec<PathBuf>) -> Vec<ScannedFile> {
    let mut out = Vec::new();
    if !root.is_dir() {
        return out;
    }
    for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let absolute_path = entry.path().to_path_buf();
        let Ok(relative) = absolute_path.strip_prefix(root) else {
            continue;
        };
        let relative_path = relative.to_string_lossy().replace('\\', "/");
        let Some(filename) = absolute_path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(_) => {
                unreadable.push(absolute_path);
                continue;
            }
        };
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        out.push(ScannedFile {
            absolute_path,
            relative_path,
            filename: filename.to_string(),
            size: metadata.len(),
            mtime,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn populate(dir: &Path) {
        std::fs::create_dir_all(dir.join("checkpoints")).unwrap();
        let mut f = std::fs::File::create(dir.join("checkpoints/sd15.safetensors")).unwrap();
        f.write_all(&vec![1u8; 4096]).unwrap();
    }

    #[test]
    fn sync_indexes_new_files_and_derives_category() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());
        let mut index = ModelIndex::open_in_memory(dir.path().to_path_buf()).unwrap();
        let report = index.sync(false).unwrap();
        assert_eq!(report.hashed, 1);

        let found = index.get_by_category("checkpoints").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].category(), Some("checkpoints"));
    }

    #[test]
    fn sync_prunes_deleted_files() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());
        let index = ModelIndex::open_in_memory(dir.path().to_path_buf()).unwrap();
        index.sync(false).unwrap();

        std::fs::remove_file(dir.path().join("checkpoints/sd15.safetensors")).unwrap();
        let report = index.sync(false).unwrap();
        assert_eq!(report.pruned_locations, 1);
        assert_eq!(report.pruned_models, 1);
        assert!(index.get_by_category("checkpoints").unwrap().is_empty());
    }

    #[test]
    fn sync_is_incremental_by_default() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());
        let index = ModelIndex::open_in_memory(dir.path().to_path_buf()).unwrap();
        index.sync(false).unwrap();
        let second = index.sync(false).unwrap();
        assert_eq!(second.hashed, 0);
        assert_eq!(second.unchanged, 1);
    }

    #[test]
    fn search_matches_filename_or_path() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());
        let index = ModelIndex::open_in_memory(dir.path().to_path_buf()).unwrap();
        index.sync(false).unwrap();
        assert_eq!(index.search("sd15").unwrap().len(), 1);
        assert_eq!(index.search("checkpoints").unwrap().len(), 1);
        assert_eq!(index.search("nonexistent").unwrap().len(), 0);
    }
}
