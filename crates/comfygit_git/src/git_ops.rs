//! Shells out to the system `git` the same way `comfygit_nodes::git_ops`
//! does, resolving the binary once via `which` and driving it with
//! `std::process::Command`. This module carries the richer command set the
//! snapshot manager needs: staging, committing, tagging, diffing trees, and
//! remote management.

use std::path::Path;
use std::process::Command;

use once_cell::sync::Lazy;

use crate::error::{GitError, GitResult};

static GIT: Lazy<Result<std::path::PathBuf, which::Error>> = Lazy::new(|| which::which("git"));

fn git_binary() -> GitResult<&'static Path> {
    GIT.as_ref().map(|p| p.as_path()).map_err(|_| GitError::GitNotFound)
}

pub fn run(repo_dir: &Path, args: &[&str]) -> GitResult<String> {
    let git = git_binary()?;
    tracing::debug!(?args, repo = %repo_dir.display(), "running git");
    let output = Command::new(git).args(args).current_dir(repo_dir).output()?;
    if !output.status.success() {
        return Err(GitError::GitCommand { command: format!("git {}", args.join(" ")), stderr: String::from_utf8_lossy(&output.stderr).to_string() });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

pub fn run_allow_failure(repo_dir: &Path, args: &[&str]) -> GitResult<(bool, String, String)> {
    let git = git_binary()?;
    let output = Command::new(git).args(args).current_dir(repo_dir).output()?;
    Ok((output.status.success(), String::from_utf8_lossy(&output.stdout).trim().to_string(), String::from_utf8_lossy(&output.stderr).trim().to_string()))
}

pub fn init(repo_dir: &Path) -> GitResult<()> {
    fs_err::create_dir_all(repo_dir)?;
    run(repo_dir, &["init", "--quiet"])?;
    Ok(())
}

pub fn is_repo(repo_dir: &Path) -> bool {
    repo_dir.join(".git").exists()
}

/// `git status --porcelain` is non-empty whenever anything is staged,
/// modified, or untracked.
pub fn has_uncommitted_changes(repo_dir: &Path) -> GitResult<bool> {
    let status = run(repo_dir, &["status", "--porcelain"])?;
    Ok(!status.is_empty())
}

pub fn stage_all(repo_dir: &Path) -> GitResult<()> {
    run(repo_dir, &["add", "-A"])?;
    Ok(())
}

pub fn commit(repo_dir: &Path, message: &str, allow_empty: bool) -> GitResult<()> {
    let mut args = vec!["commit", "-m", message];
    if allow_empty {
        args.push("--allow-empty");
    }
    run(repo_dir, &args)?;
    Ok(())
}

pub fn tag(repo_dir: &Path, name: &str) -> GitResult<()> {
    run(repo_dir, &["tag", name])?;
    Ok(())
}

pub fn list_tags(repo_dir: &Path) -> GitResult<Vec<String>> {
    let output = run(repo_dir, &["tag", "--list", "v*"])?;
    Ok(output.lines().map(str::to_string).filter(|l| !l.is_empty()).collect())
}

pub fn rev_parse(repo_dir: &Path, rev: &str) -> GitResult<String> {
    run(repo_dir, &["rev-parse", rev]).map_err(|_| GitError::UnknownTag { tag: rev.to_string() })
}

pub fn reset_hard(repo_dir: &Path, sha: &str) -> GitResult<()> {
    run(repo_dir, &["reset", "--hard", sha])?;
    run(repo_dir, &["clean", "-fd"])?;
    Ok(())
}

/// Every path `git` tracks at `rev`, relative to the repo root.
pub fn tracked_files(repo_dir: &Path, rev: &str) -> GitResult<Vec<String>> {
    let output = run(repo_dir, &["ls-tree", "-r", "--name-only", rev])?;
    Ok(output.lines().map(str::to_string).filter(|l| !l.is_empty()).collect())
}

pub fn checkout_tree(repo_dir: &Path, rev: &str) -> GitResult<()> {
    run(repo_dir, &["checkout", rev, "--", "."])?;
    Ok(())
}

pub fn current_branch(repo_dir: &Path) -> GitResult<String> {
    run(repo_dir, &["rev-parse", "--abbrev-ref", "HEAD"])
}

/// Clones `url` into `dest` (whose parent must exist, and which must not
/// itself exist yet), then checks out `reference` if given. Used for
/// populating the ComfyUI clone cache on import, the same shape
/// `comfygit_nodes::git_ops::shallow_clone` uses for git-sourced nodes.
pub fn clone(url: &str, dest: &Path, reference: Option<&str>) -> GitResult<()> {
    let git = git_binary()?;
    let dest_str = dest.to_string_lossy().to_string();
    let output = Command::new(git).args(["clone", url, dest_str.as_str()]).output()?;
    if !output.status.success() {
        return Err(GitError::GitCommand { command: format!("git clone {url}"), stderr: String::from_utf8_lossy(&output.stderr).to_string() });
    }
    if let Some(reference) = reference {
        run(dest, &["checkout", reference])?;
    }
    Ok(())
}

pub fn fetch(repo_dir: &Path, remote: &str) -> GitResult<()> {
    run(repo_dir, &["fetch", remote])?;
    Ok(())
}

pub fn merge_ff_only(repo_dir: &Path, remote_ref: &str) -> GitResult<()> {
    let (ok, _, stderr) = run_allow_failure(repo_dir, &["merge", "--ff-only", remote_ref])?;
    if !ok {
        tracing::debug!(stderr, "merge --ff-only rejected");
        return Err(GitError::NonFastForward);
    }
    Ok(())
}

pub fn push(repo_dir: &Path, remote: &str, branch: &str, force: bool) -> GitResult<()> {
    let refspec = format!("{branch}:{branch}");
    let mut args = vec!["push", remote, refspec.as_str()];
    if force {
        args.push("--force-with-lease");
    }
    run(repo_dir, &args)?;
    Ok(())
}

pub fn remote_add(repo_dir: &Path, name: &str, url: &str) -> GitResult<()> {
    run(repo_dir, &["remote", "add", name, url])?;
    Ok(())
}

pub fn remote_remove(repo_dir: &Path, name: &str) -> GitResult<()> {
    run(repo_dir, &["remote", "remove", name])?;
    Ok(())
}

pub fn remote_list(repo_dir: &Path) -> GitResult<Vec<(String, String)>> {
    let output = run(repo_dir, &["remote", "-v"])?;
    let mut seen = Vec::new();
    for line in output.lines() {
        let mut parts = line.split_whitespace();
        if let (Some(name), Some(url)) = (parts.next(), parts.next()) {
            if !seen.iter().any(|(n, _): &(String, String)| n == name) {
                seen.push((name.to_string(), url.to_string()));
            }
        }
    }
    Ok(seen)
}

/// `vN → message` commit history, newest first.
pub fn log_tagged(repo_dir: &Path, limit: usize) -> GitResult<Vec<(String, String)>> {
    let format = "--format=%H %s";
    let limit_arg = format!("-{limit}");
    let output = run(repo_dir, &["log", &limit_arg, format])?;
    let tags_by_sha = tag_lookup(repo_dir)?;
    let mut entries = Vec::new();
    for line in output.lines() {
        let Some((sha, message)) = line.split_once(' ') else { continue };
        if let Some(tag) = tags_by_sha.get(sha) {
            entries.push((tag.clone(), message.to_string()));
        }
    }
    Ok(entries)
}

fn tag_lookup(repo_dir: &Path) -> GitResult<std::collections::HashMap<String, String>> {
    let output = run(repo_dir, &["show-ref", "--tags", "-d"])?;
    let mut map = std::collections::HashMap::new();
    for line in output.lines() {
        let Some((sha, ref_name)) = line.split_once(' ') else { continue };
        let Some(tag) = ref_name.strip_prefix("refs/tags/").map(|t| t.trim_end_matches("^{}")) else { continue };
        map.insert(sha.to_string(), tag.to_string());
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_repo(dir: &Path) {
        init(dir).unwrap();
        run(dir, &["config", "user.email", "test@example.com"]).unwrap();
        run(dir, &["config", "user.name", "Test"]).unwrap();
    }

    #[test]
    fn init_creates_a_repo_and_is_repo_detects_it() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_repo(dir.path()));
        init_repo(dir.path());
        assert!(is_repo(dir.path()));
    }

    #[test]
    fn uncommitted_changes_tracks_the_working_tree() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        assert!(!has_uncommitted_changes(dir.path()).unwrap());

        fs_err::write(dir.path().join("a.txt"), "hello").unwrap();
        assert!(has_uncommitted_changes(dir.path()).unwrap());

        stage_all(dir.path()).unwrap();
        commit(dir.path(), "add a.txt", false).unwrap();
        assert!(!has_uncommitted_changes(dir.path()).unwrap());
    }

    #[test]
    fn tag_and_rev_parse_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        fs_err::write(dir.path().join("a.txt"), "hello").unwrap();
        stage_all(dir.path()).unwrap();
        commit(dir.path(), "init", false).unwrap();
        tag(dir.path(), "v1").unwrap();

        let head = rev_parse(dir.path(), "HEAD").unwrap();
        let tagged = rev_parse(dir.path(), "v1").unwrap();
        assert_eq!(head, tagged);
        assert_eq!(list_tags(dir.path()).unwrap(), vec!["v1".to_string()]);
    }

    #[test]
    fn rev_parse_unknown_tag_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let err = rev_parse(dir.path(), "v99").unwrap_err();
        assert!(matches!(err, GitError::UnknownTag { tag } if tag == "v99"));
    }

    #[test]
    fn tracked_files_reflects_committed_tree() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        fs_err::write(dir.path().join("a.txt"), "hello").unwrap();
        fs_err::create_dir_all(dir.path().join("sub")).unwrap();
        fs_err::write(dir.path().join("sub/b.txt"), "world").unwrap();
        stage_all(dir.path()).unwrap();
        commit(dir.path(), "init", false).unwrap();

        let mut files = tracked_files(dir.path(), "HEAD").unwrap();
        files.sort();
        assert_eq!(files, vec!["a.txt".to_string(), "sub/b.txt".to_string()]);
    }
}
