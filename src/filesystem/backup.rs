// src/filesystem/backup.rs

//! Snapshot-and-restore over arbitrary file sets
//!
//! A backup records a set of absolute source paths immediately before a
//! mutation. Each path is copied under the backup directory by basename; a
//! path that did not exist at snapshot time leaves a `<basename>.missing`
//! marker so restore can recreate its absence. Backups are only deleted
//! explicitly.

use crate::error::{Error, Result};
use crate::filesystem::{self, FILE_MODE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Metadata persisted next to each backup directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupMetadata {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addon_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addon_uuid: Option<String>,
    pub server_path: PathBuf,
    pub backup_path: PathBuf,
    pub files: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Creates, restores, enumerates, and deletes backups under one root
#[derive(Debug, Clone)]
pub struct BackupManager {
    backup_root: PathBuf,
}

impl BackupManager {
    pub fn new(backup_root: impl Into<PathBuf>) -> Self {
        Self {
            backup_root: backup_root.into(),
        }
    }

    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    /// Snapshot the given paths under a fresh time-derived backup ID.
    ///
    /// Any per-file failure removes the whole backup directory and returns
    /// the error; a half-taken snapshot is never left behind.
    pub fn create_backup(
        &self,
        operation: &str,
        description: &str,
        files: &[PathBuf],
    ) -> Result<BackupMetadata> {
        let timestamp = Utc::now();
        let backup_id = format!("backup_{}", timestamp.timestamp());

        let backup_dir = self.backup_root.join(&backup_id);
        filesystem::create_dir_all(&backup_dir)?;

        let mut metadata = BackupMetadata {
            id: backup_id,
            timestamp,
            operation: operation.to_string(),
            addon_name: None,
            addon_uuid: None,
            server_path: PathBuf::new(),
            backup_path: backup_dir.clone(),
            files: Vec::new(),
            description: if description.is_empty() {
                None
            } else {
                Some(description.to_string())
            },
        };

        for file in files {
            if let Err(e) = self.backup_one(file, &backup_dir) {
                if let Err(rm) = fs::remove_dir_all(&backup_dir) {
                    debug!("failed to clean up backup directory {}: {}", backup_dir.display(), rm);
                }
                return Err(Error::Other(format!(
                    "failed to back up {}: {}",
                    file.display(),
                    e
                )));
            }
            metadata.files.push(file.clone());
        }

        if let Err(e) = self.save_metadata(&metadata) {
            if let Err(rm) = fs::remove_dir_all(&backup_dir) {
                debug!("failed to clean up backup directory {}: {}", backup_dir.display(), rm);
            }
            return Err(e);
        }

        Ok(metadata)
    }

    /// Restore every path recorded in a backup.
    ///
    /// Paths with a `.missing` marker are deleted if they exist now;
    /// directories replace any live directory wholesale.
    pub fn restore_backup(&self, backup_id: &str) -> Result<()> {
        let metadata = self.load_metadata(backup_id)?;

        for original in &metadata.files {
            self.restore_one(original, &metadata.backup_path).map_err(|e| {
                Error::Other(format!("failed to restore {}: {}", original.display(), e))
            })?;
        }

        Ok(())
    }

    /// Remove a backup directory and its metadata file.
    pub fn delete_backup(&self, backup_id: &str) -> Result<()> {
        let metadata = self.load_metadata(backup_id)?;

        fs::remove_dir_all(&metadata.backup_path).map_err(|e| {
            Error::io_context(
                format!("failed to remove backup directory {}", metadata.backup_path.display()),
                e,
            )
        })?;

        let metadata_file = self.metadata_path(backup_id);
        fs::remove_file(&metadata_file).map_err(|e| {
            Error::io_context(
                format!("failed to remove metadata file {}", metadata_file.display()),
                e,
            )
        })?;

        Ok(())
    }

    /// Enumerate backups under the root, skipping unparseable metadata.
    pub fn list_backups(&self) -> Result<Vec<BackupMetadata>> {
        filesystem::create_dir_all(&self.backup_root)?;

        let mut backups = Vec::new();
        let entries = fs::read_dir(&self.backup_root).map_err(|e| {
            Error::io_context(
                format!("failed to read backup directory {}", self.backup_root.display()),
                e,
            )
        })?;

        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if entry.file_type()?.is_dir() || !name.ends_with(".json") {
                continue;
            }
            let backup_id = name.trim_end_matches(".json");
            match self.load_metadata(backup_id) {
                Ok(metadata) => backups.push(metadata),
                Err(e) => debug!("skipping unreadable backup metadata {}: {}", name, e),
            }
        }

        backups.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(backups)
    }

    /// Load metadata for a single backup ID.
    pub fn load_metadata(&self, backup_id: &str) -> Result<BackupMetadata> {
        let metadata_file = self.metadata_path(backup_id);
        let data = fs::read(&metadata_file).map_err(|e| {
            Error::io_context(
                format!("failed to read backup metadata {}", metadata_file.display()),
                e,
            )
        })?;
        let metadata = serde_json::from_slice(&data)?;
        Ok(metadata)
    }

    /// Persist (or re-persist) metadata for a backup.
    pub fn save_metadata(&self, metadata: &BackupMetadata) -> Result<()> {
        let metadata_file = self.metadata_path(&metadata.id);
        let data = serde_json::to_vec_pretty(metadata)?;
        fs::write(&metadata_file, data).map_err(|e| {
            Error::io_context(
                format!("failed to write backup metadata {}", metadata_file.display()),
                e,
            )
        })?;
        filesystem::set_mode(&metadata_file, FILE_MODE)?;
        Ok(())
    }

    fn metadata_path(&self, backup_id: &str) -> PathBuf {
        self.backup_root.join(format!("{}.json", backup_id))
    }

    fn backup_one(&self, source: &Path, backup_dir: &Path) -> Result<()> {
        let basename = source
            .file_name()
            .ok_or_else(|| Error::Other(format!("source path has no basename: {}", source.display())))?;
        let backup_path = backup_dir.join(basename);

        match fs::symlink_metadata(source) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Marker so restore can recreate the absence
                let marker = backup_dir.join(format!("{}.missing", basename.to_string_lossy()));
                fs::write(&marker, b"")?;
                filesystem::set_mode(&marker, FILE_MODE)?;
                Ok(())
            }
            Err(e) => Err(Error::io_context(
                format!("failed to stat {}", source.display()),
                e,
            )),
            Ok(info) if info.is_dir() => filesystem::copy_dir(source, &backup_path),
            Ok(_) => filesystem::copy_file(source, &backup_path),
        }
    }

    fn restore_one(&self, original: &Path, backup_dir: &Path) -> Result<()> {
        let basename = original
            .file_name()
            .ok_or_else(|| Error::Other(format!("backed-up path has no basename: {}", original.display())))?;
        let backup_path = backup_dir.join(basename);

        let marker = backup_dir.join(format!("{}.missing", basename.to_string_lossy()));
        if marker.exists() {
            if original.exists() {
                if original.is_dir() {
                    fs::remove_dir_all(original)?;
                } else {
                    fs::remove_file(original)?;
                }
            }
            return Ok(());
        }

        let info = fs::metadata(&backup_path).map_err(|e| {
            Error::io_context(format!("backup copy not found at {}", backup_path.display()), e)
        })?;

        if info.is_dir() {
            if original.exists() {
                fs::remove_dir_all(original)?;
            }
            filesystem::copy_dir(&backup_path, original)
        } else {
            filesystem::copy_file(&backup_path, original)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> BackupManager {
        BackupManager::new(dir.path().join("backups"))
    }

    #[test]
    fn test_create_and_restore_file() {
        let dir = TempDir::new().unwrap();
        let bm = manager(&dir);

        let target = dir.path().join("config.json");
        fs::write(&target, b"original").unwrap();

        let metadata = bm
            .create_backup("install", "before change", &[target.clone()])
            .unwrap();
        assert_eq!(metadata.operation, "install");
        assert_eq!(metadata.files, vec![target.clone()]);

        fs::write(&target, b"mutated").unwrap();
        bm.restore_backup(&metadata.id).unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"original");
    }

    #[test]
    fn test_missing_marker_recreates_absence() {
        let dir = TempDir::new().unwrap();
        let bm = manager(&dir);

        let target = dir.path().join("never_existed.json");
        let metadata = bm
            .create_backup("install", "", &[target.clone()])
            .unwrap();

        // The operation later created the file; restore must remove it
        fs::write(&target, b"new").unwrap();
        bm.restore_backup(&metadata.id).unwrap();
        assert!(!target.exists());
    }

    #[test]
    fn test_directory_backup_round_trip() {
        let dir = TempDir::new().unwrap();
        let bm = manager(&dir);

        let pack_dir = dir.path().join("Foo_11111111");
        fs::create_dir_all(pack_dir.join("scripts")).unwrap();
        fs::write(pack_dir.join("manifest.json"), b"{}").unwrap();
        fs::write(pack_dir.join("scripts/main.js"), b"//").unwrap();

        let metadata = bm
            .create_backup("uninstall", "", &[pack_dir.clone()])
            .unwrap();

        fs::remove_dir_all(&pack_dir).unwrap();
        bm.restore_backup(&metadata.id).unwrap();
        assert!(pack_dir.join("manifest.json").exists());
        assert!(pack_dir.join("scripts/main.js").exists());
    }

    #[test]
    fn test_list_skips_unparseable_metadata() {
        let dir = TempDir::new().unwrap();
        let bm = manager(&dir);

        let target = dir.path().join("a.json");
        fs::write(&target, b"[]").unwrap();
        let metadata = bm.create_backup("install", "", &[target]).unwrap();

        fs::write(bm.backup_root().join("backup_garbage.json"), b"not json").unwrap();

        let listed = bm.list_backups().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, metadata.id);
    }

    #[test]
    fn test_delete_backup_removes_dir_and_metadata() {
        let dir = TempDir::new().unwrap();
        let bm = manager(&dir);

        let target = dir.path().join("a.json");
        fs::write(&target, b"[]").unwrap();
        let metadata = bm.create_backup("install", "", &[target]).unwrap();

        bm.delete_backup(&metadata.id).unwrap();
        assert!(!metadata.backup_path.exists());
        assert!(bm.list_backups().unwrap().is_empty());
    }

    #[test]
    fn test_metadata_shape_is_stable() {
        let dir = TempDir::new().unwrap();
        let bm = manager(&dir);

        let target = dir.path().join("a.json");
        fs::write(&target, b"[]").unwrap();
        let metadata = bm.create_backup("install", "testing", &[target]).unwrap();

        let raw = fs::read_to_string(
            bm.backup_root().join(format!("{}.json", metadata.id)),
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.get("id").is_some());
        assert!(value.get("timestamp").is_some());
        assert!(value.get("operation").is_some());
        assert!(value.get("files").unwrap().is_array());
        // Unset optional fields are omitted, not null
        assert!(value.get("addon_uuid").is_none());
    }
}
