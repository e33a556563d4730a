//! The model symlink platform adapter. Makes `ComfyUI/models` resolve to the
//! workspace's pooled models directory: a real symlink on POSIX, a directory
//! junction on Windows, so custom nodes that bypass ComfyUI's path override
//! APIs still see the pool.

use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};

const PLACEHOLDER_NAMES: &[&str] = &[".gitkeep", ".gitignore", "Put models here.txt"];

/// `create()`/`validate()`/`remove()` against one `(link, target)` pair.
#[derive(Debug, Clone)]
pub struct ModelLink {
    link: PathBuf,
    target: PathBuf,
}

impl ModelLink {
    pub fn new(link: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self { link: link.into(), target: target.into() }
    }

    /// Establishes the link, adopting or backing up whatever currently
    /// occupies `link`'s path.
    pub fn create(&self) -> CoreResult<()> {
        fs_err::create_dir_all(&self.target).map_err(|e| CoreError::io(&self.target, e))?;

        match self.current_link_target()? {
            Some(existing) if existing == self.target => return Ok(()),
            Some(_) => self.remove_link()?,
            None => {
                if self.link.exists() {
                    self.displace_real_directory()?;
                }
            }
        }

        self.make_link()
    }

    /// Whether `link` currently resolves to `target`. Logs the anomaly (a
    /// stale link, or a real directory in the way) when it doesn't.
    pub fn validate(&self) -> CoreResult<bool> {
        match self.current_link_target()? {
            Some(existing) if existing == self.target => Ok(true),
            Some(existing) => {
                tracing::warn!(link = %self.link.display(), target = %existing.display(), expected = %self.target.display(), "models link points elsewhere");
                Ok(false)
            }
            None => {
                if self.link.exists() {
                    tracing::warn!(link = %self.link.display(), "models path is a real directory, not a link");
                }
                Ok(false)
            }
        }
    }

    /// Removes `link` only if it is actually a symlink/junction.
    pub fn remove(&self) -> CoreResult<()> {
        if self.current_link_target()?.is_some() {
            self.remove_link()?;
        }
        Ok(())
    }

    fn current_link_target(&self) -> CoreResult<Option<PathBuf>> {
        match fs_err::symlink_metadata(&self.link) {
            Ok(meta) if meta.file_type().is_symlink() => {
                let resolved = fs_err::read_link(&self.link).map_err(|e| CoreError::io(&self.link, e))?;
                Ok(Some(resolved))
            }
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::io(&self.link, e)),
        }
    }

    fn remove_link(&self) -> CoreResult<()> {
        #[cfg(windows)]
        {
            if self.link.is_dir() {
                fs_err::remove_dir(&self.link).map_err(|e| CoreError::io(&self.link, e))?;
                return Ok(());
            }
        }
        fs_err::remove_file(&self.link).map_err(|e| CoreError::io(&self.link, e))
    }

    /// `link` is a real directory: remove it if it holds nothing but
    /// placeholder files, otherwise rename it to `models.backup`.
    fn displace_real_directory(&self) -> CoreResult<()> {
        if is_empty_or_placeholder_only(&self.link).map_err(|e| CoreError::io(&self.link, e))? {
            fs_err::remove_dir_all(&self.link).map_err(|e| CoreError::io(&self.link, e))?;
            return Ok(());
        }
        let backup = self.link.with_file_name(format!(
            "{}.backup",
            self.link.file_name().and_then(|n| n.to_str()).unwrap_or("models")
        ));
        fs_err::rename(&self.link, &backup).map_err(|e| CoreError::io(&self.link, e))?;
        tracing::warn!(backup = %backup.display(), "existing models directory was not empty, backed up");
        Ok(())
    }

    #[cfg(unix)]
    fn make_link(&self) -> CoreResult<()> {
        std::os::unix::fs::symlink(&self.target, &self.link).map_err(|e| CoreError::io(&self.link, e))
    }

    #[cfg(windows)]
    fn make_link(&self) -> CoreResult<()> {
        std::os::windows::fs::symlink_dir(&self.target, &self.link).map_err(|e| CoreError::io(&self.link, e))
    }

    #[cfg(not(any(unix, windows)))]
    fn make_link(&self) -> CoreResult<()> {
        Err(CoreError::Internal("model symlinks are only supported on unix and windows".to_string()))
    }
}

fn is_empty_or_placeholder_only(dir: &Path) -> std::io::Result<bool> {
    for entry in fs_err::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if !PLACEHOLDER_NAMES.iter().any(|p| name == Path::new(p)) {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_links_a_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("comfyui/models");
        let target = dir.path().join("models");
        fs_err::create_dir_all(link.parent().unwrap()).unwrap();

        let model_link = ModelLink::new(&link, &target);
        model_link.create().unwrap();
        assert!(model_link.validate().unwrap());
    }

    #[test]
    fn create_is_idempotent_when_already_correct() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("comfyui/models");
        let target = dir.path().join("models");
        fs_err::create_dir_all(link.parent().unwrap()).unwrap();

        let model_link = ModelLink::new(&link, &target);
        model_link.create().unwrap();
        model_link.create().unwrap();
        assert!(model_link.validate().unwrap());
    }

    #[test]
    fn create_backs_up_a_nonempty_real_directory() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("comfyui/models");
        let target = dir.path().join("models");
        fs_err::create_dir_all(&link).unwrap();
        fs_err::write(link.join("real_checkpoint.safetensors"), b"data").unwrap();

        let model_link = ModelLink::new(&link, &target);
        model_link.create().unwrap();

        let backup = dir.path().join("comfyui/models.backup");
        assert!(backup.join("real_checkpoint.safetensors").exists());
        assert!(model_link.validate().unwrap());
    }

    #[test]
    fn create_removes_a_placeholder_only_directory() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("comfyui/models");
        let target = dir.path().join("models");
        fs_err::create_dir_all(&link).unwrap();
        fs_err::write(link.join(".gitkeep"), b"").unwrap();

        let model_link = ModelLink::new(&link, &target);
        model_link.create().unwrap();
        assert!(model_link.validate().unwrap());
        assert!(!dir.path().join("comfyui/models.backup").exists());
    }

    #[test]
    fn create_relinks_a_stale_target() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("comfyui/models");
        let old_target = dir.path().join("old_models");
        let new_target = dir.path().join("models");
        fs_err::create_dir_all(link.parent().unwrap()).unwrap();
        fs_err::create_dir_all(&old_target).unwrap();

        ModelLink::new(&link, &old_target).create().unwrap();

        let model_link = ModelLink::new(&link, &new_target);
        model_link.create().unwrap();
        assert!(model_link.validate().unwrap());
    }

    #[test]
    fn remove_only_touches_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("comfyui/models");
        let target = dir.path().join("models");
        fs_err::create_dir_all(link.parent().unwrap()).unwrap();

        let model_link = ModelLink::new(&link, &target);
        model_link.create().unwrap();
        model_link.remove().unwrap();
        assert!(!link.exists());
    }
}
