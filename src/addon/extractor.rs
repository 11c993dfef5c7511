// src/addon/extractor.rs

//! Addon archive extraction
//!
//! Expands a `.mcaddon` or `.mcpack` archive into a scratch directory and
//! yields the parsed packs it contains. The scratch directory is a
//! `TempDir`, so it is released on every exit path, including mid-failure.
//! `.mcaddon` containers may nest further `.mcpack` archives; nesting is
//! bounded to defeat archive-in-archive abuse.

use crate::archive::{self, ArchiveLimits};
use crate::error::{Error, Result};
use crate::manifest::{Manifest, PackType};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Maximum `.mcpack`-inside-`.mcpack` nesting depth
const MAX_NESTED_DEPTH: usize = 10;

/// A single pack found inside an extracted addon
#[derive(Debug)]
pub struct ExtractedPack {
    /// Directory holding the pack's files (the manifest's parent)
    pub path: PathBuf,
    pub manifest: Manifest,
    pub pack_type: PackType,
}

/// An extracted addon: scratch directory plus its classified packs
///
/// Dropping the value removes the scratch directory.
#[derive(Debug)]
pub struct ExtractedAddon {
    scratch: TempDir,
    pub behavior_packs: Vec<ExtractedPack>,
    pub resource_packs: Vec<ExtractedPack>,
    pub dry_run: bool,
}

impl ExtractedAddon {
    /// Path of the scratch directory holding the extracted tree.
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// All packs, behavior first, in extraction order.
    pub fn all_packs(&self) -> impl Iterator<Item = &ExtractedPack> {
        self.behavior_packs.iter().chain(self.resource_packs.iter())
    }

    pub fn pack_count(&self) -> usize {
        self.behavior_packs.len() + self.resource_packs.len()
    }
}

fn addon_extension(addon_path: &Path) -> Result<String> {
    let ext = addon_path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if ext != "mcaddon" && ext != "mcpack" {
        return Err(Error::Validation(format!(
            "unsupported file type: '{}' (expected .mcaddon or .mcpack)",
            addon_path.display()
        )));
    }
    Ok(ext)
}

/// Pre-extraction validation of an addon file: existence, extension,
/// archive integrity, and presence of at least one manifest or nested pack.
pub fn validate_addon_file(addon_path: &Path) -> Result<()> {
    if !addon_path.exists() {
        return Err(Error::Validation(format!(
            "addon file does not exist: {}",
            addon_path.display()
        )));
    }

    addon_extension(addon_path)?;

    archive::validate_archive(addon_path)
        .map_err(|e| Error::Validation(format!("archive validation failed: {}", e)))?;

    let info = archive::archive_info(addon_path)
        .map_err(|e| Error::Validation(format!("failed to analyze archive: {}", e)))?;

    if !info.has_manifest && !info.has_nested_packs {
        return Err(Error::Validation(
            "archive does not contain any manifest.json files or .mcpack files".to_string(),
        ));
    }
    if info.total_files == 0 {
        return Err(Error::Validation("archive is empty".to_string()));
    }

    Ok(())
}

/// Extract an addon archive and parse every pack it contains.
///
/// A dry run still extracts for real so analysis works on parsed data;
/// the flag only records how the result may be used.
pub fn extract_addon(
    addon_path: &Path,
    dry_run: bool,
    limits: &ArchiveLimits,
) -> Result<ExtractedAddon> {
    let ext = addon_extension(addon_path)?;

    archive::validate_archive(addon_path)
        .map_err(|e| Error::Validation(format!("archive validation failed: {}", e)))?;

    let info = archive::archive_info(addon_path)
        .map_err(|e| Error::Validation(format!("failed to analyze archive: {}", e)))?;
    if !info.has_manifest && !info.has_nested_packs {
        return Err(Error::Validation(
            "archive does not contain any manifest.json files or .mcpack files".to_string(),
        ));
    }

    // Dropped on any failure below, which removes the whole tree
    let scratch = tempfile::Builder::new()
        .prefix("addonctl-extract-")
        .tempdir()
        .map_err(|e| Error::io_context("failed to create scratch directory", e))?;

    archive::extract_archive(addon_path, scratch.path(), limits)
        .map_err(|e| Error::Other(format!("failed to extract archive: {}", e)))?;

    if ext == "mcaddon" {
        resolve_nested_packs(scratch.path(), limits)?;
    }

    let (behavior_packs, resource_packs) = collect_packs(scratch.path())?;

    Ok(ExtractedAddon {
        scratch,
        behavior_packs,
        resource_packs,
        dry_run,
    })
}

/// Repeatedly expand nested `.mcpack` archives in place.
///
/// Each nested archive is expanded into a sibling directory named after the
/// archive (without extension) and then deleted, until none remain or the
/// depth bound trips.
fn resolve_nested_packs(root: &Path, limits: &ArchiveLimits) -> Result<()> {
    for _ in 0..MAX_NESTED_DEPTH {
        let nested = find_files_with_extension(root, "mcpack")?;
        if nested.is_empty() {
            return Ok(());
        }

        for pack_path in nested {
            let stem = pack_path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "pack".to_string());
            let extract_dir = pack_path
                .parent()
                .unwrap_or(root)
                .join(stem);

            archive::extract_archive(&pack_path, &extract_dir, limits).map_err(|e| {
                Error::Other(format!(
                    "failed to extract nested pack {}: {}",
                    pack_path.display(),
                    e
                ))
            })?;

            fs::remove_file(&pack_path).map_err(|e| {
                Error::io_context(
                    format!("failed to remove nested pack archive {}", pack_path.display()),
                    e,
                )
            })?;
        }
    }

    Err(Error::Validation(format!(
        "exceeded maximum nesting depth ({}) for nested pack extraction - \
         possible malformed or malicious archive",
        MAX_NESTED_DEPTH
    )))
}

fn find_files_with_extension(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry =
            entry.map_err(|e| Error::Other(format!("failed to walk {}: {}", root.display(), e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if name.ends_with(&format!(".{}", extension)) {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

fn collect_packs(root: &Path) -> Result<(Vec<ExtractedPack>, Vec<ExtractedPack>)> {
    let mut manifests = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry =
            entry.map_err(|e| Error::Other(format!("failed to walk {}: {}", root.display(), e)))?;
        if entry.file_type().is_file()
            && entry.file_name().to_string_lossy().to_lowercase() == "manifest.json"
        {
            manifests.push(entry.into_path());
        }
    }

    if manifests.is_empty() {
        return Err(Error::Validation(
            "no manifest.json files found in extracted addon".to_string(),
        ));
    }

    let mut behavior_packs = Vec::new();
    let mut resource_packs = Vec::new();

    for manifest_path in manifests {
        let manifest = Manifest::parse_file(&manifest_path).map_err(|e| {
            Error::Validation(format!(
                "failed to parse manifest {}: {}",
                manifest_path.display(),
                e
            ))
        })?;
        manifest.validate().map_err(|e| {
            Error::Validation(format!(
                "manifest validation failed for {}: {}",
                manifest_path.display(),
                e
            ))
        })?;

        let pack_type = manifest.pack_type();
        let pack_dir = manifest_path
            .parent()
            .unwrap_or(root)
            .to_path_buf();

        let pack = ExtractedPack {
            path: pack_dir,
            manifest,
            pack_type,
        };

        match pack_type {
            PackType::Behavior => behavior_packs.push(pack),
            PackType::Resource => resource_packs.push(pack),
            PackType::Unknown => {
                return Err(Error::Validation(format!(
                    "unable to determine pack type from manifest {}",
                    manifest_path.display()
                )));
            }
        }
    }

    Ok((behavior_packs, resource_packs))
}
