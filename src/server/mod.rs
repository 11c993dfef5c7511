// src/server/mod.rs

//! Bedrock server layout discovery and validation
//!
//! A server root is resolved to its world name by scanning
//! `server.properties` for `level-name=`; there is no default world name.
//! All other paths follow the fixed Bedrock dedicated-server conventions.

pub mod config;
pub mod packs;

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Resolved paths of a Bedrock server installation
#[derive(Debug, Clone)]
pub struct ServerLayout {
    pub server_root: PathBuf,
    pub worlds_dir: PathBuf,
    pub behavior_packs_dir: PathBuf,
    pub resource_packs_dir: PathBuf,
    pub world_behavior_packs: PathBuf,
    pub world_resource_packs: PathBuf,
    pub world_behavior_history: PathBuf,
    pub world_resource_history: PathBuf,
}

impl ServerLayout {
    /// Resolve the layout of a server root.
    ///
    /// Reads `level-name` from `server.properties` and derives the world
    /// directory and config paths. Fails when the properties file, the
    /// property, or its value is missing.
    pub fn discover(server_root: impl Into<PathBuf>) -> Result<ServerLayout> {
        let server_root = server_root.into();
        let worlds_dir = server_root.join("worlds");

        let world_name = world_name_from_properties(&server_root)?;
        let world_dir = worlds_dir.join(&world_name);

        Ok(ServerLayout {
            behavior_packs_dir: server_root.join("development_behavior_packs"),
            resource_packs_dir: server_root.join("development_resource_packs"),
            world_behavior_packs: world_dir.join("world_behavior_packs.json"),
            world_resource_packs: world_dir.join("world_resource_packs.json"),
            world_behavior_history: world_dir.join("world_behavior_pack_history.json"),
            world_resource_history: world_dir.join("world_resource_pack_history.json"),
            server_root,
            worlds_dir,
        })
    }

    /// Check that the worlds and pack root directories exist.
    pub fn validate_structure(&self) -> Result<()> {
        for dir in [
            &self.worlds_dir,
            &self.behavior_packs_dir,
            &self.resource_packs_dir,
        ] {
            if !dir.is_dir() {
                return Err(Error::Layout(format!(
                    "required directory does not exist: {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    /// The world-config files and their history siblings, in backup order.
    pub fn world_config_files(&self) -> [PathBuf; 4] {
        [
            self.world_behavior_packs.clone(),
            self.world_resource_packs.clone(),
            self.world_behavior_history.clone(),
            self.world_resource_history.clone(),
        ]
    }
}

fn world_name_from_properties(server_root: &Path) -> Result<String> {
    let properties_path = server_root.join("server.properties");

    let contents = fs::read_to_string(&properties_path).map_err(|e| {
        Error::Layout(format!(
            "cannot read server.properties at {}: {}",
            properties_path.display(),
            e
        ))
    })?;

    for line in contents.lines() {
        let line = line.trim();
        if line.starts_with('#') || line.is_empty() {
            continue;
        }
        if let Some(value) = line.strip_prefix("level-name=") {
            let world_name = value.trim();
            if world_name.is_empty() {
                return Err(Error::Layout(format!(
                    "level-name property is empty in {}; set it like 'level-name=Bedrock level'",
                    properties_path.display()
                )));
            }
            return Ok(world_name.to_string());
        }
    }

    Err(Error::Layout(format!(
        "level-name property not found in {}; ensure the file has a line like 'level-name=Bedrock level'",
        properties_path.display()
    )))
}

/// A validated Bedrock server instance
#[derive(Debug, Clone)]
pub struct Server {
    layout: ServerLayout,
}

impl Server {
    /// Open a server root: resolve the layout, then validate its structure.
    pub fn open(server_root: impl Into<PathBuf>) -> Result<Server> {
        let layout = ServerLayout::discover(server_root)
            .map_err(|e| Error::Layout(format!("failed to configure server paths: {}", e)))?;
        layout
            .validate_structure()
            .map_err(|e| Error::Layout(format!("invalid server structure: {}", e)))?;
        Ok(Server { layout })
    }

    pub fn layout(&self) -> &ServerLayout {
        &self.layout
    }
}
