// src/lib.rs

//! addonctl - Bedrock addon administrator
//!
//! Installs, removes, and enumerates addons on a Minecraft Bedrock
//! dedicated server while preserving server consistency across every
//! failure mode.
//!
//! # Architecture
//!
//! - Config-first mutations: world configs are saved (atomically) before
//!   pack files move, so the recoverable state changes before the
//!   expensive state
//! - Backup-and-rollback: every mutation is preceded by a snapshot and any
//!   failure restores it
//! - Hardened extraction: archives are untrusted; traversal, absolute
//!   paths, symlinks, and decompression bombs are all fatal
//! - Warnings are first-class: orchestrators return structured results
//!   carrying both errors and warnings

pub mod addon;
pub mod archive;
mod error;
pub mod filesystem;
pub mod manifest;
pub mod progress;
pub mod server;
pub mod validation;
pub mod version;

pub use addon::{
    DependencyAnalysis, DependencyAnalyzer, DependencyGroup, InstallOptions, InstallResult,
    Installer, PackRelationship, UninstallOptions, UninstallResult, UninstallSelector, Uninstaller,
};
pub use archive::{ArchiveInfo, ArchiveLimits, DEFAULT_MAX_FILE_SIZE};
pub use error::{Error, Result};
pub use manifest::{Manifest, ManifestDependency, ModuleType, PackType};
pub use progress::{LogSteps, SilentSteps, StepTracker};
pub use server::config::{PackReference, WorldConfig};
pub use server::packs::{InstalledPack, InstalledPackWithDependencies};
pub use server::{Server, ServerLayout};
pub use version::PackVersion;
