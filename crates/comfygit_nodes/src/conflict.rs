//! Conflict detection for `custom_nodes/<dir>` before any install mutation
//! (§4.5 step 2).

use std::path::Path;

use comfygit_external::same_repository;

use crate::error::NodeResult;
use crate::git_ops::remote_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeDirectoryConflict {
    /// `<dir>` exists and isn't a git working tree at all.
    DirectoryExists,
    /// `<dir>` is a git working tree with no configured remote.
    LocalRepo,
    /// `<dir>`'s remote normalizes to the same repository as the target.
    SameRepo,
    /// `<dir>`'s remote normalizes to a different repository.
    DifferentRepo,
}

/// `None` means `<dir>` doesn't exist yet: nothing to detect.
pub fn detect_conflict(dir: &Path, target_remote: Option<&str>) -> NodeResult<Option<NodeDirectoryConflict>> {
    if !dir.exists() {
        return Ok(None);
    }

    match remote_url(dir)? {
        None => {
            if dir.join(".git").exists() {
                Ok(Some(NodeDirectoryConflict::LocalRepo))
            } else {
                Ok(Some(NodeDirectoryConflict::DirectoryExists))
            }
        }
        Some(remote) => match target_remote {
            Some(target) if same_repository(&remote, target) => Ok(Some(NodeDirectoryConflict::SameRepo)),
            Some(_) => Ok(Some(NodeDirectoryConflict::DifferentRepo)),
            None => Ok(Some(NodeDirectoryConflict::DifferentRepo)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_has_no_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nonexistent");
        assert!(detect_conflict(&target, Some("https://github.com/a/b")).unwrap().is_none());
    }

    #[test]
    fn plain_directory_is_directory_exists() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("ImpactPack");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("README.md"), "hi").unwrap();
        assert_eq!(
            detect_conflict(&target, Some("https://github.com/a/b")).unwrap(),
            Some(NodeDirectoryConflict::DirectoryExists)
        );
    }
}
