// src/archive/mod.rs

//! Hardened ZIP reading for addon archives
//!
//! Addon archives are untrusted input. Extraction enforces four fatal
//! policies: no path traversal, no absolute entry paths, no symlink
//! entries, and a per-file decompression cap. Archive analysis additionally
//! guards the size accounting against 64-bit overflow.

use crate::error::{Error, Result};
use crate::filesystem::{self, path::safe_join};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path};
use zip::ZipArchive;

/// Default per-file decompression limit (100 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Tunable extraction policy
#[derive(Debug, Clone, Copy)]
pub struct ArchiveLimits {
    /// Maximum decompressed size of a single archive entry
    pub max_file_size: u64,
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// Summary of an archive's contents, gathered from headers only
#[derive(Debug, Clone, Default)]
pub struct ArchiveInfo {
    pub total_files: usize,
    pub total_size: i64,
    pub has_manifest: bool,
    pub manifest_files: Vec<String>,
    pub top_level_dirs: Vec<String>,
    pub has_nested_packs: bool,
    pub nested_pack_files: Vec<String>,
}

fn open_archive(archive_path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(archive_path).map_err(|e| {
        Error::Archive(format!("failed to open archive {}: {}", archive_path.display(), e))
    })?;
    ZipArchive::new(file).map_err(|e| {
        Error::Archive(format!("failed to read archive {}: {}", archive_path.display(), e))
    })
}

fn has_parent_component(name: &str) -> bool {
    Path::new(name)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
}

fn is_absolute_entry(name: &str) -> bool {
    name.starts_with('/') || Path::new(name).is_absolute()
}

fn is_symlink_mode(mode: Option<u32>) -> bool {
    mode.is_some_and(|m| m & S_IFMT == S_IFLNK)
}

/// Extract a ZIP archive into a destination directory.
///
/// Each entry passes the traversal, absolute-path, and symlink policies
/// before any byte is written; each file's decompressed stream is bounded
/// by `limits.max_file_size`. Files keep their entry-declared permission
/// bits; intermediate directories are created owner-and-group only.
pub fn extract_archive(archive_path: &Path, dest_dir: &Path, limits: &ArchiveLimits) -> Result<()> {
    let mut archive = open_archive(archive_path)?;

    filesystem::create_dir_all(dest_dir)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|e| {
            Error::Archive(format!("failed to read archive entry {}: {}", index, e))
        })?;
        let name = entry.name().to_string();

        if is_symlink_mode(entry.unix_mode()) {
            return Err(Error::Validation(format!(
                "archive entry is a symbolic link: {}",
                name
            )));
        }
        if is_absolute_entry(&name) {
            return Err(Error::Validation(format!(
                "archive contains absolute file path: {}",
                name
            )));
        }

        let dest_path = safe_join(dest_dir, &name)?;

        if entry.is_dir() {
            filesystem::create_dir_all(&dest_path)?;
            if let Some(mode) = entry.unix_mode() {
                filesystem::set_mode(&dest_path, mode & 0o777)?;
            }
            continue;
        }

        if let Some(parent) = dest_path.parent() {
            filesystem::create_dir_all(parent)?;
        }

        let mut out = File::create(&dest_path).map_err(|e| {
            Error::io_context(format!("failed to create {}", dest_path.display()), e)
        })?;

        let written = io::copy(&mut (&mut entry).take(limits.max_file_size), &mut out)
            .map_err(|e| {
                Error::io_context(format!("failed to extract {}", name), e)
            })?;
        if written >= limits.max_file_size {
            return Err(Error::Validation(format!(
                "file too large after decompression: {} (exceeded {} byte limit)",
                name, limits.max_file_size
            )));
        }

        if let Some(mode) = entry.unix_mode() {
            filesystem::set_mode(&dest_path, mode & 0o777)?;
        }
    }

    Ok(())
}

/// Validate archive headers without extracting anything.
///
/// Fails on an empty archive and on any entry whose normalized path
/// contains a parent-directory segment or is absolute.
pub fn validate_archive(archive_path: &Path) -> Result<()> {
    let mut archive = open_archive(archive_path)?;

    if archive.len() == 0 {
        return Err(Error::Validation("archive is empty".to_string()));
    }

    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index).map_err(|e| {
            Error::Archive(format!("failed to read archive entry {}: {}", index, e))
        })?;
        let name = entry.name();

        if has_parent_component(name) {
            return Err(Error::Validation(format!(
                "archive contains suspicious file path: {}",
                name
            )));
        }
        if is_absolute_entry(name) {
            return Err(Error::Validation(format!(
                "archive contains absolute file path: {}",
                name
            )));
        }
    }

    Ok(())
}

/// Analyze an archive's headers: entry count, total declared size,
/// manifest presence, top-level directories, and nested pack archives.
pub fn archive_info(archive_path: &Path) -> Result<ArchiveInfo> {
    let mut archive = open_archive(archive_path)?;
    let mut info = ArchiveInfo::default();

    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index).map_err(|e| {
            Error::Archive(format!("failed to read archive entry {}: {}", index, e))
        })?;
        let name = entry.name().to_string();
        let lower = name.to_lowercase();

        info.total_files += 1;

        let size = entry.size();
        if size > i64::MAX as u64 {
            return Err(Error::Validation(format!(
                "file size too large: {} bytes",
                size
            )));
        }
        info.total_size = info
            .total_size
            .checked_add(size as i64)
            .ok_or_else(|| {
                Error::Validation("total archive size too large, would cause overflow".to_string())
            })?;

        if lower.ends_with("manifest.json") {
            info.has_manifest = true;
            info.manifest_files.push(name.clone());
        }

        if lower.ends_with(".mcpack") {
            info.has_nested_packs = true;
            info.nested_pack_files.push(name.clone());
        }

        if let Some((top, _)) = name.split_once('/') {
            if !top.is_empty() && !info.top_level_dirs.iter().any(|d| d == top) {
                info.top_level_dirs.push(top.to_string());
            }
        }
    }

    Ok(info)
}
