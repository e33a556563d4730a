//! Gzip-compressed tar archive writer/reader, grounded on pixi's own
//! `pixi_url::extract` module (plain `tar`/`flate2`, no progress bar or
//! multi-format dispatch since this crate only ever produces its own
//! archives) plus a directory-copy helper used for the ComfyUI clone cache.

use std::path::Path;

use crate::error::ImportExportResult;

/// Appends every file under `src_dir` to `builder`, rooted at `archive_prefix`.
/// Skips `__pycache__` directories and `.pyc` files, the exclusion §4.10
/// names for `dev_nodes/`.
pub fn append_dir(builder: &mut tar::Builder<impl std::io::Write>, src_dir: &Path, archive_prefix: &str) -> ImportExportResult<()> {
    if !src_dir.exists() {
        return Ok(());
    }
    for entry in walkdir::WalkDir::new(src_dir).into_iter().filter_entry(|e| e.file_name() != "__pycache__") {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().is_some_and(|ext| ext == "pyc") {
            continue;
        }
        let relative = entry.path().strip_prefix(src_dir).unwrap_or(entry.path());
        let archive_path = Path::new(archive_prefix).join(relative);
        builder.append_path_with_name(entry.path(), archive_path)?;
    }
    Ok(())
}

/// Appends a single file to `builder` under `archive_name`, a no-op if the
/// file doesn't exist (the lockfile and Python version pin are optional at
/// export time).
pub fn append_file_if_present(builder: &mut tar::Builder<impl std::io::Write>, path: &Path, archive_name: &str) -> ImportExportResult<()> {
    if path.exists() {
        builder.append_path_with_name(path, archive_name)?;
    }
    Ok(())
}

pub fn write_gzip_tar(dest: &Path, write_entries: impl FnOnce(&mut tar::Builder<flate2::write::GzEncoder<fs_err::File>>) -> ImportExportResult<()>) -> ImportExportResult<()> {
    let file = fs_err::File::create(dest)?;
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    write_entries(&mut builder)?;
    builder.into_inner()?.finish()?;
    Ok(())
}

/// Extracts `archive` (a gzip tar) into `dest`, which must already exist.
pub fn extract_gzip_tar(archive: &Path, dest: &Path) -> ImportExportResult<()> {
    let file = fs_err::File::open(archive)?;
    let decoder = flate2::read::GzDecoder::new(file);
    let mut archive = tar::Archive::new(decoder);
    archive.unpack(dest)?;
    Ok(())
}

/// Recursively copies `src` into `dest`, creating directories as needed and
/// overwriting files that already exist at the destination.
pub fn copy_dir_all(src: &Path, dest: &Path) -> ImportExportResult<()> {
    for entry in walkdir::WalkDir::new(src) {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs_err::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs_err::create_dir_all(parent)?;
            }
            fs_err::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
