// src/server/config.rs

//! World pack-config store
//!
//! A world config is the ordered list of packs a world applies; order is
//! semantically significant to the game. Loads tolerate a missing file (a
//! fresh world has none); saves always go through write-temp plus atomic
//! rename, because a partially written config renders the world unbootable.

use crate::error::{Error, Result};
use crate::filesystem::atomic_write;
use crate::version::PackVersion;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One registered pack in a world config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackReference {
    pub pack_id: String,
    pub version: PackVersion,
}

/// The ordered pack list of one world config file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldConfig {
    entries: Vec<PackReference>,
}

impl WorldConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config file. A missing file is an empty config, not an error.
    pub fn load(path: &Path) -> Result<WorldConfig> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(WorldConfig::new());
            }
            Err(e) => {
                return Err(Error::io_context(
                    format!("failed to read config file {}", path.display()),
                    e,
                ));
            }
        };

        let entries: Vec<PackReference> = serde_json::from_slice(&data).map_err(|e| {
            Error::Validation(format!(
                "failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(WorldConfig { entries })
    }

    /// Persist the config: pretty-printed JSON, written via temp file and
    /// atomic rename. This is the only allowed write path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_vec_pretty(&self.entries)?;
        atomic_write(path, &data)
            .map_err(|e| Error::Other(format!("failed to write config file {}: {}", path.display(), e)))
    }

    /// Add a pack, or update its version in place when already registered.
    /// An existing entry keeps its position in the application order.
    pub fn add_pack(&mut self, pack_id: &str, version: PackVersion) {
        for entry in &mut self.entries {
            if entry.pack_id == pack_id {
                entry.version = version;
                return;
            }
        }
        self.entries.push(PackReference {
            pack_id: pack_id.to_string(),
            version,
        });
    }

    /// Remove a pack's entry, if present.
    pub fn remove_pack(&mut self, pack_id: &str) {
        self.entries.retain(|entry| entry.pack_id != pack_id);
    }

    pub fn has_pack(&self, pack_id: &str) -> bool {
        self.entries.iter().any(|entry| entry.pack_id == pack_id)
    }

    pub fn get_pack(&self, pack_id: &str) -> Option<&PackReference> {
        self.entries.iter().find(|entry| entry.pack_id == pack_id)
    }

    pub fn entries(&self) -> &[PackReference] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let config = WorldConfig::load(&dir.path().join("world_behavior_packs.json")).unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("world_behavior_packs.json");

        let mut config = WorldConfig::new();
        config.add_pack("11111111-1111-1111-1111-111111111111", PackVersion::new(1, 0, 0));
        config.add_pack("22222222-2222-2222-2222-222222222222", PackVersion::new(2, 1, 0));
        config.save(&path).unwrap();

        let loaded = WorldConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_is_idempotent_under_repeated_adds() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = WorldConfig::new();
        config.add_pack("11111111-1111-1111-1111-111111111111", PackVersion::new(1, 0, 0));
        config.save(&path).unwrap();
        let first = fs::read(&path).unwrap();

        let mut reloaded = WorldConfig::load(&path).unwrap();
        reloaded.add_pack("11111111-1111-1111-1111-111111111111", PackVersion::new(1, 0, 0));
        reloaded.save(&path).unwrap();
        let second = fs::read(&path).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_add_updates_in_place_preserving_order() {
        let mut config = WorldConfig::new();
        config.add_pack("aaa", PackVersion::new(1, 0, 0));
        config.add_pack("bbb", PackVersion::new(1, 0, 0));
        config.add_pack("ccc", PackVersion::new(1, 0, 0));

        config.add_pack("bbb", PackVersion::new(2, 0, 0));

        let ids: Vec<_> = config.entries().iter().map(|e| e.pack_id.as_str()).collect();
        assert_eq!(ids, vec!["aaa", "bbb", "ccc"]);
        assert_eq!(config.get_pack("bbb").unwrap().version, PackVersion::new(2, 0, 0));
    }

    #[test]
    fn test_remove_pack() {
        let mut config = WorldConfig::new();
        config.add_pack("aaa", PackVersion::new(1, 0, 0));
        config.add_pack("bbb", PackVersion::new(1, 0, 0));

        config.remove_pack("aaa");
        assert!(!config.has_pack("aaa"));
        assert!(config.has_pack("bbb"));
        assert_eq!(config.len(), 1);

        // Removing an absent pack is a no-op
        config.remove_pack("zzz");
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn test_wire_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = WorldConfig::new();
        config.add_pack("11111111-1111-1111-1111-111111111111", PackVersion::new(1, 0, 0));
        config.save(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value[0]["pack_id"],
            "11111111-1111-1111-1111-111111111111"
        );
        assert_eq!(value[0]["version"], serde_json::json!([1, 0, 0]));
        // Pretty-printed output
        assert!(raw.contains('\n'));
    }

    #[test]
    fn test_no_temp_file_left_after_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        WorldConfig::new().save(&path).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["config.json"]);
    }
}
