// src/addon/backup.rs

//! Addon-scoped backup policy
//!
//! Decides which files each operation snapshots and stamps the metadata
//! with the addon identity and server root. Installs snapshot the four
//! world-config files (history siblings included; they are backed up, never
//! written). Uninstalls additionally snapshot the target pack directories.

use crate::error::Result;
use crate::filesystem::backup::{BackupManager, BackupMetadata};
use crate::manifest::PackType;
use crate::server::Server;
use std::path::PathBuf;

/// Backup manager bound to one server's layout
pub struct AddonBackups<'a> {
    server: &'a Server,
    manager: BackupManager,
}

impl<'a> AddonBackups<'a> {
    /// Default backup root under a server: `<server-root>/backups`
    pub fn default_root(server: &Server) -> PathBuf {
        server.layout().server_root.join("backups")
    }

    pub fn new(server: &'a Server, backup_root: impl Into<PathBuf>) -> Self {
        Self {
            server,
            manager: BackupManager::new(backup_root),
        }
    }

    pub fn manager(&self) -> &BackupManager {
        &self.manager
    }

    /// Snapshot world configs before an install.
    pub fn create_install_backup(
        &self,
        addon_name: Option<&str>,
        addon_uuid: Option<&str>,
    ) -> Result<BackupMetadata> {
        let files = self.server.layout().world_config_files().to_vec();
        let description = match addon_name {
            Some(name) => format!("Before installing addon: {}", name),
            None => "Before installing addon".to_string(),
        };

        let metadata = self.manager.create_backup("install", &description, &files)?;
        self.stamp(metadata, addon_name, addon_uuid)
    }

    /// Snapshot world configs plus the addon's pack directories before an
    /// uninstall, so a failed removal can put the tree back.
    pub fn create_uninstall_backup(
        &self,
        addon_name: Option<&str>,
        addon_uuid: &str,
    ) -> Result<BackupMetadata> {
        let mut files = self.server.layout().world_config_files().to_vec();

        for pack_type in [PackType::Behavior, PackType::Resource] {
            if let Ok(dir) = self.server.find_pack_dir(addon_uuid, pack_type) {
                files.push(dir);
            }
        }

        let description = match addon_name {
            Some(name) => format!("Before uninstalling addon: {}", name),
            None => "Before uninstalling addon".to_string(),
        };

        let metadata = self
            .manager
            .create_backup("uninstall", &description, &files)?;
        self.stamp(metadata, addon_name, Some(addon_uuid))
    }

    /// Restore every path recorded under a backup ID.
    pub fn restore_backup(&self, backup_id: &str) -> Result<()> {
        self.manager.restore_backup(backup_id)
    }

    /// All backups recorded for this server's backup root.
    pub fn list_backups(&self) -> Result<Vec<BackupMetadata>> {
        self.manager.list_backups()
    }

    fn stamp(
        &self,
        mut metadata: BackupMetadata,
        addon_name: Option<&str>,
        addon_uuid: Option<&str>,
    ) -> Result<BackupMetadata> {
        metadata.addon_name = addon_name.map(str::to_string);
        metadata.addon_uuid = addon_uuid.map(str::to_string);
        metadata.server_path = self.server.layout().server_root.clone();
        self.manager.save_metadata(&metadata)?;
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn test_install_backup_covers_configs_and_histories() {
        let (dir, server) = scaffold_server();
        fs::write(
            server.layout().world_behavior_packs.clone(),
            b"[]",
        )
        .unwrap();

        let backups = AddonBackups::new(&server, dir.path().join("backups"));
        let metadata = backups
            .create_install_backup(Some("Foo"), Some("11111111-1111-1111-1111-111111111111"))
            .unwrap();

        assert_eq!(metadata.operation, "install");
        assert_eq!(metadata.files.len(), 4);
        assert!(metadata
            .files
            .contains(&server.layout().world_behavior_packs));
        assert!(metadata
            .files
            .contains(&server.layout().world_resource_history));

        // Existing file copied, missing ones marked
        assert!(metadata.backup_path.join("world_behavior_packs.json").exists());
        assert!(metadata
            .backup_path
            .join("world_resource_packs.json.missing")
            .exists());
    }

    #[test]
    fn test_metadata_stamped_and_persisted() {
        let (dir, server) = scaffold_server();
        let backups = AddonBackups::new(&server, dir.path().join("backups"));

        let metadata = backups
            .create_install_backup(Some("Foo"), Some("11111111-1111-1111-1111-111111111111"))
            .unwrap();
        assert_eq!(metadata.addon_name.as_deref(), Some("Foo"));
        assert_eq!(metadata.server_path, server.layout().server_root);

        // Re-load from disk: the stamped fields survived persistence
        let loaded = backups.manager().load_metadata(&metadata.id).unwrap();
        assert_eq!(loaded.addon_name.as_deref(), Some("Foo"));
        assert_eq!(
            loaded.addon_uuid.as_deref(),
            Some("11111111-1111-1111-1111-111111111111")
        );
    }

    #[test]
    fn test_uninstall_backup_includes_pack_dir() {
        let (dir, server) = scaffold_server();

        let uuid = "11111111-1111-1111-1111-111111111111";
        let pack_dir = dir.path().join("development_behavior_packs/Foo_11111111");
        fs::create_dir_all(&pack_dir).unwrap();
        fs::write(
            pack_dir.join("manifest.json"),
            format!(
                r#"{{
                    "format_version": 2,
                    "header": {{ "name": "Foo", "uuid": "{uuid}", "version": [1, 0, 0] }},
                    "modules": [ {{ "type": "data", "uuid": "22222222-2222-2222-2222-222222222222", "version": [1, 0, 0] }} ]
                }}"#
            ),
        )
        .unwrap();

        let backups = AddonBackups::new(&server, dir.path().join("backups"));
        let metadata = backups
            .create_uninstall_backup(Some("Foo"), uuid)
            .unwrap();

        assert_eq!(metadata.operation, "uninstall");
        assert!(metadata.files.contains(&pack_dir));
        assert!(metadata.backup_path.join("Foo_11111111/manifest.json").exists());
    }
}
