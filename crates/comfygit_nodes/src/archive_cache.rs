//! Workspace-wide node archive cache keyed by `(package_id, resolved_ref)`,
//! so re-installing the same version never re-downloads (§4.5 step 3).

use std::path::{Path, PathBuf};

use crate::error::{NodeError, NodeResult};

pub struct ArchiveCache {
    root: PathBuf,
}

impl ArchiveCache {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn entry_dir(&self, package_id: &str, reference: &str) -> PathBuf {
        self.root.join(format!("{package_id}@{reference}"))
    }

    /// `Some(path)` if a cached extracted copy already exists.
    pub fn lookup(&self, package_id: &str, reference: &str) -> Option<PathBuf> {
        let dir = self.entry_dir(package_id, reference);
        dir.is_dir().then_some(dir)
    }

    /// Extracts a downloaded archive into the cache slot for
    /// `(package_id, reference)`, replacing any prior contents.
    pub fn store_archive(&self, package_id: &str, reference: &str, archive_path: &Path) -> NodeResult<PathBuf> {
        let dest = self.entry_dir(package_id, reference);
        if dest.exists() {
            fs_err::remove_dir_all(&dest)?;
        }
        fs_err::create_dir_all(&dest)?;
        extract_archive(archive_path, &dest).map_err(|source| NodeError::Archive { package_id: package_id.to_string(), source })?;
        Ok(dest)
    }

    /// Copies a cached (or freshly cloned) source tree into `custom_nodes/<dir>`.
    pub fn copy_into(&self, source: &Path, dest: &Path) -> NodeResult<()> {
        if let Some(parent) = dest.parent() {
            fs_err::create_dir_all(parent)?;
        }
        copy_dir_recursive(source, dest)?;
        Ok(())
    }
}

fn extract_archive(archive_path: &Path, dest: &Path) -> std::io::Result<()> {
    let extension = archive_path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if extension == "zip" {
        let file = fs_err::File::open(archive_path)?;
        let mut zip = zip::ZipArchive::new(file).map_err(io_err)?;
        zip.extract(dest).map_err(io_err)?;
    } else {
        let file = fs_err::File::open(archive_path)?;
        let decoder = flate2::read::GzDecoder::new(file);
        let mut archive = tar::Archive::new(decoder);
        archive.unpack(dest)?;
    }
    strip_single_top_level_dir(dest)
}

fn io_err<E: std::fmt::Display>(err: E) -> std::io::Error {
    std::io::Error::other(err.to_string())
}

/// GitHub codeload tarballs and most registry archives wrap their contents in
/// a single `<repo>-<ref>/` directory; flatten it so `dest` holds the
/// package root directly.
fn strip_single_top_level_dir(dest: &Path) -> std::io::Result<()> {
    let entries: Vec<_> = fs_err::read_dir(dest)?.collect::<Result<_, _>>()?;
    if entries.len() != 1 || !entries[0].path().is_dir() {
        return Ok(());
    }
    let inner = entries[0].path();
    let temp = dest.with_extension("extract-tmp");
    fs_err::rename(&inner, &temp)?;
    for entry in fs_err::read_dir(&temp)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        fs_err::rename(entry.path(), target)?;
    }
    fs_err::remove_dir_all(&temp)?;
    Ok(())
}

fn copy_dir_recursive(source: &Path, dest: &Path) -> std::io::Result<()> {
    if dest.exists() {
        fs_err::remove_dir_all(dest)?;
    }
    fs_err::create_dir_all(dest)?;
    for entry in fs_err::read_dir(source)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs_err::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_misses_until_stored() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArchiveCache::new(dir.path().to_path_buf());
        assert!(cache.lookup("comfyui-impact-pack", "v2.0").is_none());
    }

    #[test]
    fn copy_into_mirrors_source_tree() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        fs_err::create_dir_all(source.join("nested")).unwrap();
        fs_err::write(source.join("requirements.txt"), "numpy\n").unwrap();
        fs_err::write(source.join("nested/file.py"), "x = 1\n").unwrap();

        let cache = ArchiveCache::new(dir.path().join("cache"));
        let dest = dir.path().join("custom_nodes/ImpactPack");
        cache.copy_into(&source, &dest).unwrap();

        assert!(dest.join("requirements.txt").exists());
        assert!(dest.join("nested/file.py").exists());
    }
}
