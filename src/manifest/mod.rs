// src/manifest/mod.rs

//! Pack manifest model, decoding, and validation
//!
//! A `manifest.json` declares a pack's identity (header UUID + version),
//! its modules, and its dependencies. Dependency entries are polymorphic:
//! the `version` field is either a three-integer array (a dependency on
//! another pack, keyed by UUID) or a dotted string (a dependency on a
//! Script API module, keyed by module name). The decoder picks the variant
//! by the shape of the raw value.

use crate::error::{Error, Result};
use crate::validation::{is_valid_uuid, short_uuid};
use crate::version::PackVersion;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Accepted manifest format versions
pub const SUPPORTED_FORMAT_VERSIONS: [i32; 2] = [1, 2];

/// Module types a manifest may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    Data,
    Resources,
    Script,
    SkinPack,
    WorldTemplate,
}

/// The kind of pack a manifest describes, decided by its first module
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackType {
    Behavior,
    Resource,
    Unknown,
}

impl std::fmt::Display for PackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackType::Behavior => write!(f, "behavior"),
            PackType::Resource => write!(f, "resource"),
            PackType::Unknown => write!(f, "unknown"),
        }
    }
}

/// `header` section of a manifest
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestHeader {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub uuid: String,
    pub version: PackVersion,
    #[serde(default)]
    pub min_engine_version: Option<PackVersion>,
}

/// One entry of the `modules` sequence
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestModule {
    #[serde(rename = "type")]
    pub module_type: ModuleType,
    pub uuid: String,
    pub version: PackVersion,
    #[serde(default)]
    pub description: String,
}

/// A declared dependency, either on another pack or on a Script API module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestDependency {
    /// Depends on another pack, identified by UUID
    Pack { uuid: String, version: PackVersion },
    /// Depends on a runtime module such as `@minecraft/server`
    Module { module_name: String, version: String },
}

impl ManifestDependency {
    /// The pack UUID, when this is a pack dependency
    pub fn pack_uuid(&self) -> Option<&str> {
        match self {
            ManifestDependency::Pack { uuid, .. } => Some(uuid),
            ManifestDependency::Module { .. } => None,
        }
    }

    /// The module name, when this is a module dependency
    pub fn module_name(&self) -> Option<&str> {
        match self {
            ManifestDependency::Module { module_name, .. } => Some(module_name),
            ManifestDependency::Pack { .. } => None,
        }
    }
}

impl<'de> Deserialize<'de> for ManifestDependency {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as DeError;

        #[derive(Deserialize)]
        struct RawDependency {
            #[serde(default)]
            uuid: Option<String>,
            #[serde(default)]
            module_name: Option<String>,
            #[serde(default)]
            version: Option<serde_json::Value>,
        }

        let raw = RawDependency::deserialize(deserializer)?;

        match raw.version {
            Some(value @ serde_json::Value::Array(_)) => {
                let version: PackVersion = serde_json::from_value(value).map_err(|e| {
                    DeError::custom(format!("failed to parse dependency version: {}", e))
                })?;
                let uuid = raw.uuid.ok_or_else(|| {
                    DeError::custom("pack dependency with array version is missing uuid")
                })?;
                Ok(ManifestDependency::Pack { uuid, version })
            }
            Some(serde_json::Value::String(version)) => {
                let module_name = raw.module_name.ok_or_else(|| {
                    DeError::custom("module dependency with string version is missing module_name")
                })?;
                Ok(ManifestDependency::Module {
                    module_name,
                    version,
                })
            }
            Some(other) => Err(DeError::custom(format!(
                "unsupported dependency version shape: {}",
                other
            ))),
            // No version field: the present identifier decides the variant
            None => {
                if let Some(uuid) = raw.uuid {
                    Ok(ManifestDependency::Pack {
                        uuid,
                        version: PackVersion::ZERO,
                    })
                } else if let Some(module_name) = raw.module_name {
                    Ok(ManifestDependency::Module {
                        module_name,
                        version: String::new(),
                    })
                } else {
                    Err(DeError::custom(
                        "dependency entry has neither uuid nor module_name",
                    ))
                }
            }
        }
    }
}

/// A parsed `manifest.json`
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub format_version: i32,
    pub header: ManifestHeader,
    #[serde(default)]
    pub modules: Vec<ManifestModule>,
    #[serde(default)]
    pub dependencies: Vec<ManifestDependency>,
}

impl Manifest {
    /// Parse a manifest from raw bytes, checking required fields.
    pub fn parse(data: &[u8]) -> Result<Manifest> {
        let manifest: Manifest = serde_json::from_slice(data)
            .map_err(|e| Error::Validation(format!("failed to parse manifest JSON: {}", e)))?;

        if manifest.header.uuid.is_empty() {
            return Err(Error::Validation(
                "manifest missing required UUID in header".to_string(),
            ));
        }
        if manifest.modules.is_empty() {
            return Err(Error::Validation(
                "manifest missing required modules".to_string(),
            ));
        }

        Ok(manifest)
    }

    /// Parse a manifest from a file on disk.
    pub fn parse_file(path: &Path) -> Result<Manifest> {
        let data = fs::read(path).map_err(|e| {
            Error::io_context(format!("failed to open manifest file {}", path.display()), e)
        })?;
        Self::parse(&data)
    }

    /// The pack type, decided by the first module: `data` and `script`
    /// modules make a behavior pack, `resources` a resource pack.
    pub fn pack_type(&self) -> PackType {
        match self.modules.first().map(|m| m.module_type) {
            Some(ModuleType::Data) | Some(ModuleType::Script) => PackType::Behavior,
            Some(ModuleType::Resources) => PackType::Resource,
            _ => PackType::Unknown,
        }
    }

    /// Human-readable name: the header name, or `Pack-` plus the UUID
    /// short prefix when the name is empty.
    pub fn display_name(&self) -> String {
        if !self.header.name.is_empty() {
            self.header.name.clone()
        } else {
            format!("Pack-{}", short_uuid(&self.header.uuid))
        }
    }

    /// Pack-UUID dependencies declared by this manifest.
    pub fn pack_dependencies(&self) -> impl Iterator<Item = (&str, PackVersion)> {
        self.dependencies.iter().filter_map(|d| match d {
            ManifestDependency::Pack { uuid, version } => Some((uuid.as_str(), *version)),
            ManifestDependency::Module { .. } => None,
        })
    }

    /// Module-name dependencies declared by this manifest.
    pub fn module_dependencies(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().filter_map(|d| d.module_name())
    }

    /// Full validation of a decoded manifest.
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_FORMAT_VERSIONS.contains(&self.format_version) {
            return Err(Error::Validation(format!(
                "unsupported format version: {} (expected 1 or 2)",
                self.format_version
            )));
        }

        if !is_valid_uuid(&self.header.uuid) {
            return Err(Error::Validation(format!(
                "invalid header UUID format: '{}'",
                self.header.uuid
            )));
        }

        if let Some(index) = self.header.version.first_negative() {
            return Err(Error::Validation(format!(
                "header version[{}] cannot be negative: {}",
                index, self.header.version.0[index]
            )));
        }

        if let Some(min) = self.header.min_engine_version {
            if !min.is_zero() {
                if let Some(index) = min.first_negative() {
                    return Err(Error::Validation(format!(
                        "min_engine_version[{}] cannot be negative: {}",
                        index, min.0[index]
                    )));
                }
            }
        }

        if self.modules.is_empty() {
            return Err(Error::Validation(
                "manifest must have at least one module".to_string(),
            ));
        }

        let mut seen_module_uuids = std::collections::HashSet::new();
        for (index, module) in self.modules.iter().enumerate() {
            if !is_valid_uuid(&module.uuid) {
                return Err(Error::Validation(format!(
                    "invalid module UUID format: '{}' at index {}",
                    module.uuid, index
                )));
            }
            if !seen_module_uuids.insert(module.uuid.clone()) {
                return Err(Error::Validation(format!(
                    "duplicate module UUID: {}",
                    module.uuid
                )));
            }
            if let Some(component) = module.version.first_negative() {
                return Err(Error::Validation(format!(
                    "module version[{}] cannot be negative: {} (module index {})",
                    component, module.version.0[component], index
                )));
            }
        }

        for (index, dep) in self.dependencies.iter().enumerate() {
            if let ManifestDependency::Pack { uuid, version } = dep {
                if !is_valid_uuid(uuid) {
                    return Err(Error::Validation(format!(
                        "invalid dependency UUID format: '{}' at index {}",
                        uuid, index
                    )));
                }
                if let Some(component) = version.first_negative() {
                    return Err(Error::Validation(format!(
                        "dependency version[{}] cannot be negative: {} (dependency index {})",
                        component, version.0[component], index
                    )));
                }
            }
        }

        Ok(())
    }
}
