// src/server/packs.rs

//! On-disk pack store
//!
//! The transactional layer over pack directories and world configs.
//! Installs are config-first: the world config is saved before files are
//! copied, so a failed copy only needs the small JSON rolled back, not a
//! half-written directory tree.

use super::config::WorldConfig;
use super::Server;
use crate::error::{Error, Result};
use crate::filesystem::copy_dir;
use crate::manifest::{Manifest, PackType};
use crate::validation::{normalize_uuid, short_uuid};
use crate::version::PackVersion;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A pack registered in a world config, joined with its on-disk manifest
#[derive(Debug, Clone, Serialize)]
pub struct InstalledPack {
    pub pack_id: String,
    pub name: String,
    pub description: String,
    pub version: PackVersion,
    #[serde(rename = "type")]
    pub pack_type: PackType,
}

/// An installed pack enriched with its declared dependencies
#[derive(Debug, Clone, Serialize)]
pub struct InstalledPackWithDependencies {
    #[serde(flatten)]
    pub pack: InstalledPack,
    /// Pack UUIDs this pack depends on
    pub dependencies: Vec<String>,
    /// Script API modules this pack uses
    pub modules: Vec<String>,
}

impl Server {
    /// Pack root directory and world config file for a pack type.
    pub fn pack_target(&self, pack_type: PackType) -> Result<(&Path, &Path)> {
        let layout = self.layout();
        match pack_type {
            PackType::Behavior => Ok((
                layout.behavior_packs_dir.as_path(),
                layout.world_behavior_packs.as_path(),
            )),
            PackType::Resource => Ok((
                layout.resource_packs_dir.as_path(),
                layout.world_resource_packs.as_path(),
            )),
            PackType::Unknown => Err(Error::Validation("unknown pack type".to_string())),
        }
    }

    /// Final directory name for an installed pack:
    /// `<display-name>_<8-char-uuid-prefix>`.
    pub fn pack_dir_name(manifest: &Manifest) -> String {
        format!(
            "{}_{}",
            manifest.display_name(),
            short_uuid(&normalize_uuid(&manifest.header.uuid))
        )
    }

    /// Install one pack: register it in the world config, then copy the
    /// staged directory into the pack root.
    ///
    /// If the copy fails the config change is rolled back (restoring the
    /// prior entry when the pack was already registered). A rollback
    /// failure is reported to stderr with manual-cleanup instructions; the
    /// copy error is what propagates.
    pub fn install_pack(&self, manifest: &Manifest, staged_dir: &Path) -> Result<()> {
        let pack_type = manifest.pack_type();
        let (target_dir, config_file) = self.pack_target(pack_type).map_err(|_| {
            Error::Validation(format!(
                "unknown pack type for pack {}",
                manifest.header.uuid
            ))
        })?;

        let pack_id = normalize_uuid(&manifest.header.uuid);
        let final_pack_dir = target_dir.join(Self::pack_dir_name(manifest));

        let mut config = WorldConfig::load(config_file)
            .map_err(|e| Error::Other(format!("failed to load config: {}", e)))?;

        // Remember the prior entry so a failed copy can be rolled back
        let prior_entry = config.get_pack(&pack_id).cloned();

        config.add_pack(&pack_id, manifest.header.version);
        config
            .save(config_file)
            .map_err(|e| Error::Other(format!("failed to save config: {}", e)))?;

        let dir_existed = final_pack_dir.exists();
        if let Err(copy_err) = copy_dir(staged_dir, &final_pack_dir) {
            // Drop any partially copied tree this call created
            if !dir_existed && final_pack_dir.is_dir() {
                if let Err(e) = fs::remove_dir_all(&final_pack_dir) {
                    debug!(
                        "failed to remove partial pack directory {}: {}",
                        final_pack_dir.display(),
                        e
                    );
                }
            }

            let mut rollback = config;
            match &prior_entry {
                Some(prior) => rollback.add_pack(&prior.pack_id, prior.version),
                None => rollback.remove_pack(&pack_id),
            }

            if let Err(rollback_err) = rollback.save(config_file) {
                eprintln!(
                    "Warning: failed to roll back config after copy failure: {}",
                    rollback_err
                );
                match &prior_entry {
                    Some(prior) => eprintln!(
                        "Manual cleanup may be required: restore pack {} version {} in {}",
                        pack_id,
                        prior.version,
                        config_file.display()
                    ),
                    None => eprintln!(
                        "Manual cleanup may be required: remove pack {} from {}",
                        pack_id,
                        config_file.display()
                    ),
                }
            }

            return Err(Error::Other(format!(
                "failed to copy pack files: {}",
                copy_err
            )));
        }

        Ok(())
    }

    /// Uninstall a pack by UUID: deregister it from whichever world config
    /// holds it, then delete its directory. A failed directory removal
    /// restores the config.
    pub fn uninstall_pack(&self, pack_id: &str) -> Result<()> {
        let pack_id = normalize_uuid(pack_id);

        for pack_type in [PackType::Behavior, PackType::Resource] {
            let (packs_dir, config_file) = self.pack_target(pack_type)?;

            let config = WorldConfig::load(config_file)
                .map_err(|e| Error::Other(format!("failed to load config: {}", e)))?;
            if !config.has_pack(&pack_id) {
                continue;
            }

            let mut updated = config.clone();
            updated.remove_pack(&pack_id);
            updated
                .save(config_file)
                .map_err(|e| Error::Other(format!("failed to save config: {}", e)))?;

            if let Err(remove_err) = self.remove_pack_dir(packs_dir, &pack_id) {
                if let Err(rollback_err) = config.save(config_file) {
                    eprintln!(
                        "Warning: failed to roll back config after directory removal failure: {}",
                        rollback_err
                    );
                    eprintln!(
                        "Manual cleanup may be required: re-add pack {} to {}",
                        pack_id,
                        config_file.display()
                    );
                }
                return Err(Error::Other(format!(
                    "failed to remove {} pack directory: {}",
                    pack_type, remove_err
                )));
            }

            return Ok(());
        }

        Err(Error::Conflict(format!(
            "pack with UUID {} is not installed on this server. \
             Use 'addonctl list <server-path>' to see all installed packs",
            pack_id
        )))
    }

    /// Enumerate installed packs from both world configs, enriched with
    /// name and description from the on-disk manifest when available.
    pub fn installed_packs(&self) -> Result<Vec<InstalledPack>> {
        let mut packs = Vec::new();

        for pack_type in [PackType::Behavior, PackType::Resource] {
            let (packs_dir, config_file) = self.pack_target(pack_type)?;
            let config = WorldConfig::load(config_file)
                .map_err(|e| Error::Other(format!("failed to load config: {}", e)))?;

            for entry in config.entries() {
                let mut pack = InstalledPack {
                    pack_id: entry.pack_id.clone(),
                    name: String::new(),
                    description: String::new(),
                    version: entry.version,
                    pack_type,
                };

                match self.find_manifest_in(packs_dir, &entry.pack_id) {
                    Ok(manifest) => {
                        pack.name = manifest.display_name();
                        pack.description = manifest.header.description.clone();
                    }
                    Err(e) => {
                        // Registered but not on disk: still listed, name empty
                        debug!("no readable manifest for {}: {}", entry.pack_id, e);
                    }
                }

                packs.push(pack);
            }
        }

        Ok(packs)
    }

    /// Enumerate installed packs with their declared pack and module
    /// dependencies.
    pub fn installed_packs_with_dependencies(
        &self,
    ) -> Result<Vec<InstalledPackWithDependencies>> {
        let packs = self.installed_packs()?;

        let mut enriched = Vec::with_capacity(packs.len());
        for pack in packs {
            let mut item = InstalledPackWithDependencies {
                dependencies: Vec::new(),
                modules: Vec::new(),
                pack,
            };

            if let Ok(manifest) = self.find_manifest(&item.pack.pack_id, item.pack.pack_type) {
                for (uuid, _) in manifest.pack_dependencies() {
                    item.dependencies.push(uuid.to_string());
                }
                for module in manifest.module_dependencies() {
                    item.modules.push(module.to_string());
                }
            }

            enriched.push(item);
        }

        Ok(enriched)
    }

    /// Find and load the manifest of an installed pack by UUID and type.
    pub fn find_manifest(&self, pack_id: &str, pack_type: PackType) -> Result<Manifest> {
        let (packs_dir, _) = self.pack_target(pack_type)?;
        self.find_manifest_in(packs_dir, pack_id)
    }

    /// Find the directory of an installed pack by UUID.
    pub fn find_pack_dir(&self, pack_id: &str, pack_type: PackType) -> Result<PathBuf> {
        let (packs_dir, _) = self.pack_target(pack_type)?;
        let wanted = normalize_uuid(pack_id);

        for entry in read_pack_dirs(packs_dir)? {
            let manifest_path = entry.join("manifest.json");
            let manifest = match Manifest::parse_file(&manifest_path) {
                Ok(m) => m,
                Err(_) => continue,
            };
            if normalize_uuid(&manifest.header.uuid) == wanted {
                return Ok(entry);
            }
        }

        Err(Error::Conflict(format!(
            "pack directory not found for UUID: {}",
            pack_id
        )))
    }

    fn find_manifest_in(&self, packs_dir: &Path, pack_id: &str) -> Result<Manifest> {
        let wanted = normalize_uuid(pack_id);

        for entry in read_pack_dirs(packs_dir)? {
            let manifest = match Manifest::parse_file(&entry.join("manifest.json")) {
                Ok(m) => m,
                Err(_) => continue,
            };
            if normalize_uuid(&manifest.header.uuid) == wanted {
                return Ok(manifest);
            }
        }

        Err(Error::Conflict(format!(
            "manifest not found for pack ID {}",
            pack_id
        )))
    }

    fn remove_pack_dir(&self, packs_dir: &Path, pack_id: &str) -> Result<()> {
        let wanted = normalize_uuid(pack_id);

        for entry in read_pack_dirs(packs_dir)? {
            let manifest = match Manifest::parse_file(&entry.join("manifest.json")) {
                Ok(m) => m,
                Err(_) => continue,
            };
            if normalize_uuid(&manifest.header.uuid) == wanted {
                return fs::remove_dir_all(&entry).map_err(|e| {
                    Error::io_context(format!("failed to remove {}", entry.display()), e)
                });
            }
        }

        Err(Error::Conflict(format!(
            "pack directory not found for pack ID {}",
            pack_id
        )))
    }
}

fn read_pack_dirs(packs_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(packs_dir).map_err(|e| {
        Error::io_context(format!("failed to read directory {}", packs_dir.display()), e)
    })?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scaffold_server() -> (TempDir, Server) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("worlds/test-world")).unwrap();
        fs::create_dir_all(dir.path().join("development_behavior_packs")).unwrap();
        fs::create_dir_all(dir.path().join("development_resource_packs")).unwrap();
        fs::write(dir.path().join("server.properties"), "level-name=test-world\n").unwrap();
        let server = Server::open(dir.path()).unwrap();
        (dir, server)
    }

    fn stage_pack(dir: &TempDir, name: &str, uuid: &str, module_type: &str) -> (PathBuf, Manifest) {
        let staged = dir.path().join("staging").join(uuid);
        fs::create_dir_all(&staged).unwrap();
        let manifest_json = format!(
            r#"{{
                "format_version": 2,
                "header": {{
                    "name": "{name}",
                    "description": "test",
                    "uuid": "{uuid}",
                    "version": [1, 0, 0]
                }},
                "modules": [
                    {{ "type": "{module_type}", "uuid": "99999999-0000-0000-0000-{suffix}", "version": [1, 0, 0] }}
                ]
            }}"#,
            suffix = &uuid[uuid.len() - 12..],
        );
        fs::write(staged.join("manifest.json"), &manifest_json).unwrap();
        fs::write(staged.join("payload.bin"), b"data").unwrap();
        let manifest = Manifest::parse(manifest_json.as_bytes()).unwrap();
        (staged, manifest)
    }

    const UUID_A: &str = "11111111-1111-1111-1111-111111111111";
    const UUID_B: &str = "22222222-2222-2222-2222-222222222222";

    #[test]
    fn test_install_pack_registers_and_copies() {
        let (dir, server) = scaffold_server();
        let (staged, manifest) = stage_pack(&dir, "Foo", UUID_A, "data");

        server.install_pack(&manifest, &staged).unwrap();

        let pack_dir = dir
            .path()
            .join("development_behavior_packs/Foo_11111111");
        assert!(pack_dir.join("manifest.json").exists());
        assert!(pack_dir.join("payload.bin").exists());

        let config = WorldConfig::load(&server.layout().world_behavior_packs).unwrap();
        assert!(config.has_pack(UUID_A));
        assert_eq!(config.get_pack(UUID_A).unwrap().version, PackVersion::new(1, 0, 0));
    }

    #[test]
    fn test_install_rolls_back_config_on_copy_failure() {
        let (dir, server) = scaffold_server();
        let (staged, manifest) = stage_pack(&dir, "Foo", UUID_A, "data");

        // Pre-create the target directory name as an unwritable file so the
        // recursive copy fails
        let blocker = dir
            .path()
            .join("development_behavior_packs/Foo_11111111");
        fs::write(&blocker, b"in the way").unwrap();

        let err = server.install_pack(&manifest, &staged).unwrap_err();
        assert!(err.to_string().contains("copy"));

        let config = WorldConfig::load(&server.layout().world_behavior_packs).unwrap();
        assert!(!config.has_pack(UUID_A));
    }

    #[test]
    fn test_install_replaces_existing_entry_in_place() {
        let (dir, server) = scaffold_server();
        let (staged_a, manifest_a) = stage_pack(&dir, "Foo", UUID_A, "data");
        let (staged_b, manifest_b) = stage_pack(&dir, "Bar", UUID_B, "data");
        server.install_pack(&manifest_a, &staged_a).unwrap();
        server.install_pack(&manifest_b, &staged_b).unwrap();

        // Reinstall the first pack with a new version
        let (staged_a2, mut manifest_a2) = stage_pack(&dir, "Foo", UUID_A, "data");
        manifest_a2.header.version = PackVersion::new(2, 0, 0);
        server.install_pack(&manifest_a2, &staged_a2).unwrap();

        let config = WorldConfig::load(&server.layout().world_behavior_packs).unwrap();
        let ids: Vec<_> = config.entries().iter().map(|e| e.pack_id.as_str()).collect();
        assert_eq!(ids, vec![UUID_A, UUID_B], "position preserved across replace");
        assert_eq!(config.get_pack(UUID_A).unwrap().version, PackVersion::new(2, 0, 0));
    }

    #[test]
    fn test_uninstall_pack() {
        let (dir, server) = scaffold_server();
        let (staged, manifest) = stage_pack(&dir, "Foo", UUID_A, "data");
        server.install_pack(&manifest, &staged).unwrap();

        server.uninstall_pack(UUID_A).unwrap();

        let config = WorldConfig::load(&server.layout().world_behavior_packs).unwrap();
        assert!(!config.has_pack(UUID_A));
        assert!(!dir
            .path()
            .join("development_behavior_packs/Foo_11111111")
            .exists());
    }

    #[test]
    fn test_uninstall_missing_pack_suggests_list() {
        let (_dir, server) = scaffold_server();
        let err = server.uninstall_pack(UUID_A).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("is not installed"));
        assert!(text.contains("list"));
    }

    #[test]
    fn test_installed_packs_joins_config_and_disk() {
        let (dir, server) = scaffold_server();
        let (staged, manifest) = stage_pack(&dir, "Foo", UUID_A, "data");
        server.install_pack(&manifest, &staged).unwrap();

        // A registered pack with no on-disk manifest still appears
        let mut config = WorldConfig::load(&server.layout().world_resource_packs).unwrap();
        config.add_pack(UUID_B, PackVersion::new(3, 0, 0));
        config.save(&server.layout().world_resource_packs).unwrap();

        let packs = server.installed_packs().unwrap();
        assert_eq!(packs.len(), 2);

        let foo = packs.iter().find(|p| p.pack_id == UUID_A).unwrap();
        assert_eq!(foo.name, "Foo");
        assert_eq!(foo.pack_type, PackType::Behavior);

        let ghost = packs.iter().find(|p| p.pack_id == UUID_B).unwrap();
        assert!(ghost.name.is_empty());
        assert_eq!(ghost.pack_type, PackType::Resource);
        assert_eq!(ghost.version, PackVersion::new(3, 0, 0));
    }

    #[test]
    fn test_uuid_comparison_is_normalized() {
        let (dir, server) = scaffold_server();
        let (staged, manifest) = stage_pack(&dir, "Foo", UUID_A, "data");
        server.install_pack(&manifest, &staged).unwrap();

        // Mixed-case lookup still resolves
        let upper = UUID_A.to_uppercase();
        let found = server.find_manifest(&upper, PackType::Behavior).unwrap();
        assert_eq!(found.header.uuid, UUID_A);

        server.uninstall_pack(&upper).unwrap();
        assert!(server.installed_packs().unwrap().is_empty());
    }

    #[test]
    fn test_resource_pack_routed_to_resource_dirs() {
        let (dir, server) = scaffold_server();
        let (staged, manifest) = stage_pack(&dir, "Tex", UUID_B, "resources");
        server.install_pack(&manifest, &staged).unwrap();

        assert!(dir
            .path()
            .join("development_resource_packs/Tex_22222222/manifest.json")
            .exists());
        let config = WorldConfig::load(&server.layout().world_resource_packs).unwrap();
        assert!(config.has_pack(UUID_B));
    }
}
