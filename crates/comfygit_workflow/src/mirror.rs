//! Mirrors the committed `.cec/workflows/*.json` copies into ComfyUI's own
//! `user/default/workflows/` directory (§4.7 rollback, §4.8 step 4): every
//! file in the committed set is copied across, and every `.json` file on
//! the ComfyUI side with no committed counterpart is deleted.

use std::collections::HashSet;
use std::path::Path;

use crate::error::{WorkflowError, WorkflowResult};

#[derive(Debug, Clone, Default)]
pub struct MirrorOutcome {
    pub restored: Vec<String>,
    pub deleted: Vec<String>,
}

pub fn mirror_workflows(committed_dir: &Path, comfyui_workflows_dir: &Path) -> WorkflowResult<MirrorOutcome> {
    fs_err::create_dir_all(comfyui_workflows_dir).map_err(|source| io_err(comfyui_workflows_dir, source))?;

    let committed_names = json_file_names(committed_dir)?;
    let existing_names = json_file_names(comfyui_workflows_dir)?;

    let mut outcome = MirrorOutcome::default();

    for name in &committed_names {
        let source = committed_dir.join(name);
        let dest = comfyui_workflows_dir.join(name);
        fs_err::copy(&source, &dest).map_err(|source_err| io_err(&dest, source_err))?;
        outcome.restored.push(name.clone());
    }

    for name in existing_names.difference(&committed_names) {
        let dest = comfyui_workflows_dir.join(name);
        fs_err::remove_file(&dest).map_err(|source| io_err(&dest, source))?;
        outcome.deleted.push(name.clone());
    }

    Ok(outcome)
}

fn json_file_names(dir: &Path) -> WorkflowResult<HashSet<String>> {
    if !dir.exists() {
        return Ok(HashSet::new());
    }
    let mut names = HashSet::new();
    for entry in fs_err::read_dir(dir).map_err(|source| io_err(dir, source))? {
        let entry = entry.map_err(|source| io_err(dir, source))?;
        if entry.path().extension().and_then(|e| e.to_str()) == Some("json") {
            names.insert(entry.file_name().to_string_lossy().to_string());
        }
    }
    Ok(names)
}

fn io_err(path: &Path, source: std::io::Error) -> WorkflowError {
    WorkflowError::Io { path: path.to_path_buf(), source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restores_committed_and_deletes_stale() {
        let dir = tempfile::tempdir().unwrap();
        let committed = dir.path().join("committed");
        let comfyui = dir.path().join("comfyui");
        fs_err::create_dir_all(&committed).unwrap();
        fs_err::create_dir_all(&comfyui).unwrap();

        fs_err::write(committed.join("a.json"), "{}").unwrap();
        fs_err::write(comfyui.join("stale.json"), "{}").unwrap();

        let outcome = mirror_workflows(&committed, &comfyui).unwrap();

        assert!(comfyui.join("a.json").exists());
        assert!(!comfyui.join("stale.json").exists());
        assert_eq!(outcome.restored, vec!["a.json".to_string()]);
        assert_eq!(outcome.deleted, vec!["stale.json".to_string()]);
    }

    #[test]
    fn missing_comfyui_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let committed = dir.path().join("committed");
        fs_err::create_dir_all(&committed).unwrap();
        fs_err::write(committed.join("a.json"), "{}").unwrap();

        let comfyui = dir.path().join("nested/comfyui");
        let outcome = mirror_workflows(&committed, &comfyui).unwrap();
        assert!(comfyui.join("a.json").exists());
        assert_eq!(outcome.restored, vec!["a.json".to_string()]);
    }
}
