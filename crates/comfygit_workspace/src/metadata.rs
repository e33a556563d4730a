use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use comfygit_consts::WORKSPACE_SCHEMA_VERSION;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// The `workspace.json` metadata record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceMetadata {
    pub version: u32,
    pub active_environment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub global_model_directory: Option<GlobalModelDirectory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalModelDirectory {
    pub path: std::path::PathBuf,
    pub added_at: DateTime<Utc>,
    pub last_sync: Option<DateTime<Utc>>,
}

impl Default for WorkspaceMetadata {
    fn default() -> Self {
        Self {
            version: WORKSPACE_SCHEMA_VERSION,
            active_environment: None,
            created_at: Utc::now(),
            global_model_directory: None,
        }
    }
}

impl WorkspaceMetadata {
    pub fn load(path: &Path) -> CoreResult<Self> {
        let contents = fs_err::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
        serde_json::from_str(&contents)
            .map_err(|e| CoreError::ManifestSchema(format!("{path:?}: {e}")))
    }

    /// Writes the metadata atomically: write to a sibling temp file, `fsync`,
    /// then rename over the destination so a crash never leaves a torn file.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent).map_err(|e| CoreError::io(parent, e))?;
        }
        let contents =
            serde_json::to_string_pretty(self).map_err(|e| CoreError::Internal(e.to_string()))?;

        let tmp_path = path.with_extension("json.tmp");
        {
            let mut tmp = fs_err::File::create(&tmp_path).map_err(|e| CoreError::io(&tmp_path, e))?;
            tmp.write_all(contents.as_bytes())
                .map_err(|e| CoreError::io(&tmp_path, e))?;
            tmp.write_all(b"\n").map_err(|e| CoreError::io(&tmp_path, e))?;
            tmp.sync_all().map_err(|e| CoreError::io(&tmp_path, e))?;
        }
        fs_err::rename(&tmp_path, path).map_err(|e| CoreError::io(path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".metadata/workspace.json");
        let mut meta = WorkspaceMetadata::default();
        meta.active_environment = Some("default".to_string());
        meta.save(&path).unwrap();

        let loaded = WorkspaceMetadata::load(&path).unwrap();
        assert_eq!(loaded.active_environment.as_deref(), Some("default"));
        assert_eq!(loaded.version, WORKSPACE_SCHEMA_VERSION);
    }

    #[test]
    fn save_leaves_no_tmp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workspace.json");
        WorkspaceMetadata::default().save(&path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
    }
}
