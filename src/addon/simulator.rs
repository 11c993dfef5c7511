// src/addon/simulator.rs

//! Dry-run simulation of pack operations
//!
//! Computes exactly which directory, config file, and config entry an
//! install or uninstall would touch, without mutating anything. Dry-run
//! results carry these details so the operator can see the real plan.

use crate::addon::extractor::ExtractedPack;
use crate::error::Result;
use crate::manifest::PackType;
use crate::server::config::PackReference;
use crate::server::Server;
use crate::validation::normalize_uuid;
use crate::version::PackVersion;
use std::path::PathBuf;

/// The concrete effects one pack install would have
#[derive(Debug, Clone)]
pub struct SimulatedInstall {
    pub pack_name: String,
    pub pack_uuid: String,
    pub pack_version: PackVersion,
    pub pack_type: PackType,
    pub source_path: PathBuf,
    /// Final pack directory that would be created
    pub target_directory: PathBuf,
    /// World config file that would be updated
    pub config_file: PathBuf,
    /// Entry that would be added or replaced
    pub config_entry: PackReference,
}

/// The concrete effects one pack uninstall would have
#[derive(Debug, Clone)]
pub struct SimulatedUninstall {
    pub pack_name: String,
    pub pack_uuid: String,
    pub pack_type: PackType,
    /// Directory that would be deleted, when it exists on disk
    pub directory_to_remove: Option<PathBuf>,
    pub config_file: PathBuf,
}

/// Simulate installing one extracted pack.
pub fn simulate_install(server: &Server, pack: &ExtractedPack) -> Result<SimulatedInstall> {
    let manifest = &pack.manifest;
    let (target_dir, config_file) = server.pack_target(pack.pack_type)?;

    let pack_uuid = normalize_uuid(&manifest.header.uuid);
    let target_directory = target_dir.join(Server::pack_dir_name(manifest));

    Ok(SimulatedInstall {
        pack_name: manifest.display_name(),
        pack_uuid: pack_uuid.clone(),
        pack_version: manifest.header.version,
        pack_type: pack.pack_type,
        source_path: pack.path.clone(),
        target_directory,
        config_file: config_file.to_path_buf(),
        config_entry: PackReference {
            pack_id: pack_uuid,
            version: manifest.header.version,
        },
    })
}

impl SimulatedInstall {
    /// Detail lines for a dry-run result.
    pub fn detail_lines(&self) -> Vec<String> {
        vec![
            format!(
                "would create {} pack directory: {}",
                self.pack_type,
                self.target_directory.display()
            ),
            format!("would update config file: {}", self.config_file.display()),
            format!(
                "would add pack entry: {} (UUID: {}, Version: {})",
                self.pack_name, self.pack_uuid, self.pack_version
            ),
        ]
    }
}

/// Simulate uninstalling an installed pack by UUID.
pub fn simulate_uninstall(
    server: &Server,
    pack_uuid: &str,
    pack_name: &str,
    pack_type: PackType,
) -> Result<SimulatedUninstall> {
    let (_, config_file) = server.pack_target(pack_type)?;
    let directory_to_remove = server.find_pack_dir(pack_uuid, pack_type).ok();

    Ok(SimulatedUninstall {
        pack_name: pack_name.to_string(),
        pack_uuid: normalize_uuid(pack_uuid),
        pack_type,
        directory_to_remove,
        config_file: config_file.to_path_buf(),
    })
}

impl SimulatedUninstall {
    /// Detail lines for a dry-run result.
    pub fn detail_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "would remove pack entry {} from {}",
            self.pack_uuid,
            self.config_file.display()
        )];
        match &self.directory_to_remove {
            Some(dir) => lines.push(format!("would remove pack directory: {}", dir.display())),
            None => lines.push("no pack directory found on disk".to_string()),
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Manifest;
    use std::fs;
    use tempfile::TempDir;

    fn scaffold_server() -> (TempDir, Server) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("worlds/w")).unwrap();
        fs::create_dir_all(dir.path().join("development_behavior_packs")).unwrap();
        fs::create_dir_all(dir.path().join("development_resource_packs")).unwrap();
        fs::write(dir.path().join("server.properties"), "level-name=w\n").unwrap();
        let server = Server::open(dir.path()).unwrap();
        (dir, server)
    }

    #[test]
    fn test_simulate_install_plans_paths_without_mutation() {
        let (dir, server) = scaffold_server();

        let manifest = Manifest::parse(
            br#"{
                "format_version": 2,
                "header": {
                    "name": "Foo",
                    "uuid": "11111111-1111-1111-1111-111111111111",
                    "version": [1, 2, 3]
                },
                "modules": [
                    { "type": "data", "uuid": "22222222-2222-2222-2222-222222222222", "version": [1, 0, 0] }
                ]
            }"#,
        )
        .unwrap();

        let pack = ExtractedPack {
            path: dir.path().join("staged"),
            pack_type: manifest.pack_type(),
            manifest,
        };

        let sim = simulate_install(&server, &pack).unwrap();
        assert_eq!(
            sim.target_directory,
            dir.path().join("development_behavior_packs/Foo_11111111")
        );
        assert_eq!(sim.config_file, server.layout().world_behavior_packs);
        assert_eq!(sim.config_entry.pack_id, "11111111-1111-1111-1111-111111111111");
        assert_eq!(sim.pack_version, PackVersion::new(1, 2, 3));

        // Nothing was created
        assert!(!sim.target_directory.exists());
        assert!(!sim.config_file.exists());
        assert!(!sim.detail_lines().is_empty());
    }

    #[test]
    fn test_simulate_uninstall_without_directory() {
        let (_dir, server) = scaffold_server();
        let sim = simulate_uninstall(
            &server,
            "11111111-1111-1111-1111-111111111111",
            "Foo",
            PackType::Behavior,
        )
        .unwrap();
        assert!(sim.directory_to_remove.is_none());
        assert_eq!(sim.detail_lines().len(), 2);
    }
}
