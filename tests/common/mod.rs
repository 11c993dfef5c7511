// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const WORLD_NAME: &str = "Bedrock level";

/// Create a scratch Bedrock server layout with empty world configs.
///
/// Returns (TempDir, server root) - keep the TempDir alive to prevent
/// cleanup.
pub fn setup_server() -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().to_path_buf();

    let world_dir = root.join("worlds").join(WORLD_NAME);
    fs::create_dir_all(&world_dir).unwrap();
    fs::create_dir_all(root.join("development_behavior_packs")).unwrap();
    fs::create_dir_all(root.join("development_resource_packs")).unwrap();

    fs::write(
        root.join("server.properties"),
        format!("# test server\nserver-name=Test\nlevel-name={}\n", WORLD_NAME),
    )
    .unwrap();

    fs::write(world_dir.join("world_behavior_packs.json"), "[]").unwrap();
    fs::write(world_dir.join("world_resource_packs.json"), "[]").unwrap();

    (temp_dir, root)
}

/// Build a manifest.json body with optional pack-UUID dependencies.
pub fn manifest_json(name: &str, uuid: &str, module_type: &str, deps: &[&str]) -> String {
    let module_uuid = format!("9999{}", &uuid[4..]);
    let deps_json: Vec<String> = deps
        .iter()
        .map(|dep| format!(r#"{{ "uuid": "{}", "version": [1, 0, 0] }}"#, dep))
        .collect();

    format!(
        r#"{{
            "format_version": 2,
            "header": {{
                "name": "{name}",
                "description": "integration fixture",
                "uuid": "{uuid}",
                "version": [1, 0, 0]
            }},
            "modules": [
                {{ "type": "{module_type}", "uuid": "{module_uuid}", "version": [1, 0, 0] }}
            ],
            "dependencies": [{deps}]
        }}"#,
        deps = deps_json.join(", "),
    )
}

/// Write a `.mcpack` archive holding a single pack.
pub fn write_mcpack(path: &Path, manifest: &str) {
    write_archive(path, &[("manifest.json", manifest.as_bytes().to_vec())]);
}

/// Write a `.mcaddon` archive holding several packs as subdirectories.
pub fn write_mcaddon(path: &Path, packs: &[(&str, String)]) {
    let entries: Vec<(String, Vec<u8>)> = packs
        .iter()
        .map(|(dir, manifest)| {
            (
                format!("{}/manifest.json", dir),
                manifest.as_bytes().to_vec(),
            )
        })
        .collect();
    let borrowed: Vec<(&str, Vec<u8>)> = entries
        .iter()
        .map(|(name, content)| (name.as_str(), content.clone()))
        .collect();
    write_archive(path, &borrowed);
}

/// Write a ZIP archive with arbitrary entries.
pub fn write_archive(path: &Path, entries: &[(&str, Vec<u8>)]) {
    let file = File::create(path).unwrap();
    let mut writer = ZipWriter::new(file);
    for (name, content) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
}

/// Parsed world-config entries of a config file, for assertions.
pub fn config_entries(path: &Path) -> Vec<serde_json::Value> {
    if !path.exists() {
        return Vec::new();
    }
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}
