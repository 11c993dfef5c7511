// src/filesystem/mod.rs

//! Filesystem primitives shared by the pack store, extractor, and backups
//!
//! Copies preserve mode bits. Directories created on behalf of untrusted
//! input use owner+group-read permissions; metadata files are owner-only.

pub mod backup;
pub mod path;

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Mode for directories this crate creates (`rwxr-x---`)
pub const DIR_MODE: u32 = 0o750;

/// Mode for metadata files this crate creates (`rw-------`)
pub const FILE_MODE: u32 = 0o600;

/// Create a directory tree with [`DIR_MODE`] permissions on each new level.
pub fn create_dir_all(dir: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new()
            .recursive(true)
            .mode(DIR_MODE)
            .create(dir)
            .map_err(|e| Error::io_context(format!("failed to create directory {}", dir.display()), e))
    }
    #[cfg(not(unix))]
    {
        fs::create_dir_all(dir)
            .map_err(|e| Error::io_context(format!("failed to create directory {}", dir.display()), e))
    }
}

/// Set permissions from a raw mode, where the platform supports it.
pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .map_err(|e| Error::io_context(format!("failed to set mode on {}", path.display()), e))?;
    }
    #[cfg(not(unix))]
    let _ = (path, mode);
    Ok(())
}

/// Copy a single file, creating parent directories and preserving the
/// source's mode bits.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        create_dir_all(parent)?;
    }

    fs::copy(src, dst).map_err(|e| {
        Error::io_context(
            format!("failed to copy {} to {}", src.display(), dst.display()),
            e,
        )
    })?;

    let metadata = fs::metadata(src)
        .map_err(|e| Error::io_context(format!("failed to stat {}", src.display()), e))?;
    fs::set_permissions(dst, metadata.permissions())
        .map_err(|e| Error::io_context(format!("failed to set mode on {}", dst.display()), e))?;

    Ok(())
}

/// Recursively copy a directory tree, preserving mode bits on files and
/// directories.
pub fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| {
            Error::Other(format!("failed to walk {}: {}", src.display(), e))
        })?;

        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::Other(format!("failed to relativize {}: {}", entry.path().display(), e)))?;
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| {
                Error::io_context(format!("failed to create directory {}", target.display()), e)
            })?;
            let metadata = entry
                .metadata()
                .map_err(|e| Error::Other(format!("failed to stat {}: {}", entry.path().display(), e)))?;
            fs::set_permissions(&target, metadata.permissions()).map_err(|e| {
                Error::io_context(format!("failed to set mode on {}", target.display()), e)
            })?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }

    Ok(())
}

/// Write a file atomically: write to `<path>.tmp`, then rename over the
/// target. On rename failure the temp file is removed before the error
/// propagates. The temp file sits next to the target, so the rename stays
/// on one filesystem.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let tmp = path.with_extension(match path.extension() {
        Some(ext) => format!("{}.tmp", ext.to_string_lossy()),
        None => "tmp".to_string(),
    });

    fs::write(&tmp, data)
        .map_err(|e| Error::io_context(format!("failed to write {}", tmp.display()), e))?;

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(Error::io_context(
            format!("failed to rename {} to {}", tmp.display(), path.display()),
            e,
        ));
    }

    Ok(())
}
