//! The snapshot manager (§4.7): versions `.cec/`'s contents behind an
//! auto-append `v1, v2, …` tag namespace, with rollback's delete-then-
//! restore-then-mirror-then-commit state machine.

use std::path::PathBuf;

use comfygit_workflow::{mirror_workflows, MirrorOutcome};

use crate::error::{GitError, GitResult};
use crate::git_ops;
use crate::tags::next_tag;

#[derive(Debug, Clone)]
pub struct RollbackOutcome {
    pub tag: String,
    pub deleted_paths: Vec<String>,
    pub mirror: MirrorOutcome,
}

#[derive(Debug, Clone)]
pub struct PullOutcome {
    pub previous_head: String,
    pub new_head: String,
    pub fast_forwarded: bool,
}

pub struct GitSnapshotManager {
    cec_dir: PathBuf,
    comfyui_workflows_dir: PathBuf,
}

impl GitSnapshotManager {
    pub fn new(cec_dir: PathBuf, comfyui_workflows_dir: PathBuf) -> Self {
        Self { cec_dir, comfyui_workflows_dir }
    }

    /// Initializes the `.cec/.git` repo if it doesn't already exist. A no-op
    /// otherwise; every environment's invariant is that this repo always
    /// exists once the environment itself does.
    pub fn init(&self) -> GitResult<()> {
        if !git_ops::is_repo(&self.cec_dir) {
            git_ops::init(&self.cec_dir)?;
        }
        Ok(())
    }

    pub fn has_uncommitted_changes(&self) -> GitResult<bool> {
        git_ops::has_uncommitted_changes(&self.cec_dir)
    }

    pub fn current_head(&self) -> GitResult<String> {
        git_ops::rev_parse(&self.cec_dir, "HEAD")
    }

    /// Stages everything in `.cec/`, commits, and assigns the next `vN` tag.
    pub fn commit(&self, message: &str) -> GitResult<String> {
        git_ops::stage_all(&self.cec_dir)?;
        git_ops::commit(&self.cec_dir, message, false)?;
        self.tag_head()
    }

    fn tag_head(&self) -> GitResult<String> {
        let tags = git_ops::list_tags(&self.cec_dir)?;
        let tag = next_tag(&tags);
        git_ops::tag(&self.cec_dir, &tag)?;
        Ok(tag)
    }

    /// Resolves `target` (a `vN` tag, short/long SHA, or `HEAD~k`) and
    /// restores `.cec/`'s tracked tree to it, deleting tracked paths that
    /// exist now but didn't at `target` (the historical rollback bug this
    /// fixes: extra workflow files used to survive a rollback). Mirrors the
    /// restored `workflows/` into ComfyUI's own workflow directory, then
    /// commits the result as a new tag. Any failure resets the working tree
    /// back to its pre-rollback state before the error is surfaced.
    pub fn rollback(&self, target: &str) -> GitResult<RollbackOutcome> {
        let pre_sha = self.current_head()?;
        match self.try_rollback(target) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                git_ops::reset_hard(&self.cec_dir, &pre_sha).ok();
                Err(err)
            }
        }
    }

    fn try_rollback(&self, target: &str) -> GitResult<RollbackOutcome> {
        let target_sha = git_ops::rev_parse(&self.cec_dir, target)?;
        let current_files = git_ops::tracked_files(&self.cec_dir, "HEAD")?;
        let target_files: std::collections::HashSet<String> = git_ops::tracked_files(&self.cec_dir, &target_sha)?.into_iter().collect();

        let deleted_paths: Vec<String> = current_files.into_iter().filter(|p| !target_files.contains(p)).collect();
        for path in &deleted_paths {
            let full = self.cec_dir.join(path);
            if full.is_file() {
                fs_err::remove_file(&full)?;
            }
        }

        git_ops::checkout_tree(&self.cec_dir, &target_sha)?;

        let mirror = mirror_workflows(&self.cec_dir.join("workflows"), &self.comfyui_workflows_dir)?;

        git_ops::stage_all(&self.cec_dir)?;
        git_ops::commit(&self.cec_dir, &format!("Rollback to {target}"), true)?;
        let tag = self.tag_head()?;

        Ok(RollbackOutcome { tag, deleted_paths, mirror })
    }

    pub fn push(&self, remote: &str, force: bool) -> GitResult<()> {
        if self.has_uncommitted_changes()? {
            return Err(GitError::UncommittedChanges);
        }
        let branch = git_ops::current_branch(&self.cec_dir)?;
        git_ops::push(&self.cec_dir, remote, &branch, force)
    }

    /// Refuses (or, with `force`, discards) uncommitted changes, fetches,
    /// and fast-forwards. Running the reconciliation pipeline against the
    /// merged state, and reverting to `previous_head` if it fails, is the
    /// caller's responsibility (it needs node/Python collaborators this
    /// crate doesn't depend on).
    pub fn pull(&self, remote: &str, force: bool) -> GitResult<PullOutcome> {
        if self.has_uncommitted_changes()? {
            if force {
                git_ops::reset_hard(&self.cec_dir, "HEAD")?;
            } else {
                return Err(GitError::UncommittedChanges);
            }
        }

        let previous_head = self.current_head()?;
        git_ops::fetch(&self.cec_dir, remote)?;
        let branch = git_ops::current_branch(&self.cec_dir)?;
        git_ops::merge_ff_only(&self.cec_dir, &format!("{remote}/{branch}"))?;
        let new_head = self.current_head()?;

        Ok(PullOutcome { fast_forwarded: new_head != previous_head, previous_head, new_head })
    }

    /// Used by a caller that ran `pull()` successfully but then failed its
    /// own reconciliation pass; resets `.cec/` back to the pre-pull commit.
    pub fn revert_to(&self, sha: &str) -> GitResult<()> {
        git_ops::reset_hard(&self.cec_dir, sha)
    }

    pub fn remote_add(&self, name: &str, url: &str) -> GitResult<()> {
        git_ops::remote_add(&self.cec_dir, name, url)
    }

    pub fn remote_remove(&self, name: &str) -> GitResult<()> {
        git_ops::remote_remove(&self.cec_dir, name)
    }

    pub fn remote_list(&self) -> GitResult<Vec<(String, String)>> {
        git_ops::remote_list(&self.cec_dir)
    }

    /// `vN → message`, reverse chronological.
    pub fn log(&self, limit: usize) -> GitResult<Vec<(String, String)>> {
        git_ops::log_tagged(&self.cec_dir, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_manager(root: &std::path::Path) -> GitSnapshotManager {
        let cec = root.join(".cec");
        let workflows = root.join("ComfyUI/user/default/workflows");
        fs_err::create_dir_all(&cec).unwrap();
        let manager = GitSnapshotManager::new(cec, workflows);
        manager.init().unwrap();
        git_ops::run(&manager.cec_dir, &["config", "user.email", "test@example.com"]).unwrap();
        git_ops::run(&manager.cec_dir, &["config", "user.name", "Test"]).unwrap();
        manager
    }

    #[test]
    fn commit_assigns_sequential_tags() {
        let dir = tempfile::tempdir().unwrap();
        let manager = init_manager(dir.path());
        fs_err::write(manager.cec_dir.join("pyproject.toml"), "[project]\nname=\"x\"\n").unwrap();
        let tag1 = manager.commit("init").unwrap();
        assert_eq!(tag1, "v1");

        fs_err::write(manager.cec_dir.join("pyproject.toml"), "[project]\nname=\"y\"\n").unwrap();
        let tag2 = manager.commit("update").unwrap();
        assert_eq!(tag2, "v2");
    }

    #[test]
    fn rollback_deletes_paths_absent_from_target() {
        let dir = tempfile::tempdir().unwrap();
        let manager = init_manager(dir.path());
        fs_err::write(manager.cec_dir.join("pyproject.toml"), "[project]\nname=\"x\"\n").unwrap();
        manager.commit("init").unwrap();

        fs_err::write(manager.cec_dir.join("extra.txt"), "scratch").unwrap();
        manager.commit("add extra file").unwrap();

        let outcome = manager.rollback("v1").unwrap();
        assert_eq!(outcome.tag, "v3");
        assert!(outcome.deleted_paths.contains(&"extra.txt".to_string()));
        assert!(!manager.cec_dir.join("extra.txt").exists());
    }

    #[test]
    fn push_without_remote_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let manager = init_manager(dir.path());
        fs_err::write(manager.cec_dir.join("pyproject.toml"), "[project]\nname=\"x\"\n").unwrap();
        manager.commit("init").unwrap();
        let err = manager.push("origin", false).unwrap_err();
        assert!(matches!(err, GitError::GitCommand { .. }));
    }
}
