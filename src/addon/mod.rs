// src/addon/mod.rs

//! Addon lifecycle orchestration
//!
//! Ties the lower layers together: extraction of addon archives, dependency
//! analysis over installed packs, backup policy, and the install/uninstall
//! pipelines with rollback.

pub mod backup;
pub mod dependencies;
pub mod extractor;
pub mod installer;
pub mod simulator;
pub mod uninstaller;

pub use backup::AddonBackups;
pub use dependencies::{
    unsatisfied_dependencies, DependencyAnalysis, DependencyAnalyzer, DependencyGroup,
    MissingDependency, PackRelationship,
};
pub use extractor::{extract_addon, validate_addon_file, ExtractedAddon, ExtractedPack};
pub use installer::{InstallOptions, InstallResult, Installer};
pub use uninstaller::{UninstallOptions, UninstallResult, UninstallSelector, Uninstaller};
