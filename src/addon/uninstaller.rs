// src/addon/uninstaller.rs

//! Addon removal pipeline
//!
//! Locate, dependency impact, dry-run short-circuit, backup, apply,
//! post-validate. Dependents are reported as warnings and do not block
//! removal by default (operator authority); `block_on_dependents` makes the
//! refusal force-gated like install-time conflicts.

use crate::addon::backup::AddonBackups;
use crate::addon::simulator;
use crate::error::{Error, Result};
use crate::filesystem::backup::BackupMetadata;
use crate::progress::{SilentSteps, StepTracker};
use crate::server::packs::InstalledPack;
use crate::server::Server;
use crate::validation::normalize_uuid;
use std::sync::Arc;
use tracing::info;

/// How the pack to remove is identified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UninstallSelector {
    /// Case-insensitive substring match on the display name
    #[default]
    NameSubstring,
    /// Exact (normalized) UUID match
    UuidExact,
}

/// Options controlling one uninstall invocation
#[derive(Clone)]
pub struct UninstallOptions {
    pub dry_run: bool,
    pub verbose: bool,
    pub selector: UninstallSelector,
    /// Refuse removal when other packs depend on the target
    pub block_on_dependents: bool,
    /// Overrides `block_on_dependents`
    pub force: bool,
    pub tracker: Arc<dyn StepTracker>,
}

impl Default for UninstallOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            verbose: false,
            selector: UninstallSelector::default(),
            block_on_dependents: false,
            force: false,
            tracker: Arc::new(SilentSteps::new()),
        }
    }
}

/// Structured outcome of an uninstall
#[derive(Debug, Clone, Default)]
pub struct UninstallResult {
    pub success: bool,
    pub removed_packs: Vec<String>,
    pub backup: Option<BackupMetadata>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub rolled_back: bool,
    /// False when some installed manifest could not be read during the
    /// dependents scan, making the impact report incomplete
    pub dependency_check_complete: bool,
    pub simulated_operations: Vec<String>,
}

/// Orchestrates addon removal against one server
pub struct Uninstaller<'a> {
    server: &'a Server,
    backups: AddonBackups<'a>,
}

impl<'a> Uninstaller<'a> {
    pub fn new(server: &'a Server, backup_root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            server,
            backups: AddonBackups::new(server, backup_root),
        }
    }

    /// Remove an addon identified by UUID or name fragment.
    pub fn uninstall(&self, identifier: &str, options: &UninstallOptions) -> UninstallResult {
        let mut result = UninstallResult {
            dependency_check_complete: true,
            ..Default::default()
        };

        match self.run(identifier, options, &mut result) {
            Ok(()) => {
                result.success = true;
            }
            Err(e) => {
                result.errors.push(e.to_string());
            }
        }

        result
    }

    fn run(
        &self,
        identifier: &str,
        options: &UninstallOptions,
        result: &mut UninstallResult,
    ) -> Result<()> {
        let tracker = options.tracker.as_ref();

        if options.verbose {
            info!("starting uninstallation of {}", identifier);
        }

        // Step 1: locate the target pack
        let target = self.locate(identifier, options.selector)?;

        tracker.step_completed(
            "Locate pack",
            &[format!(
                "found pack: {} (UUID: {}, Type: {})",
                target.name, target.pack_id, target.pack_type
            )],
        );
        self.gate(
            tracker,
            "Dependency impact",
            "Check whether other installed packs depend on this pack.",
        )?;

        // Step 2: dependency impact; never aborts, but incompleteness is
        // recorded on the result
        let dependents = self.dependents_of(&target.pack_id, result);
        for dependent in &dependents {
            result.warnings.push(format!(
                "pack {} depends on the pack being removed",
                dependent
            ));
        }

        tracker.step_completed("Dependency impact", &impact_details(&dependents, result));

        if options.block_on_dependents && !options.force && !dependents.is_empty() {
            return Err(Error::Dependency(format!(
                "{} installed pack(s) depend on {}; use --force to remove anyway",
                dependents.len(),
                target.name
            )));
        }

        // Step 3: dry-run short-circuit
        if options.dry_run {
            let sim = simulator::simulate_uninstall(
                self.server,
                &target.pack_id,
                &target.name,
                target.pack_type,
            )?;
            result.simulated_operations.extend(sim.detail_lines());
            result.removed_packs.push(target.name.clone());
            tracker.step_completed("Uninstall simulation", &result.simulated_operations);
            if options.verbose {
                info!("dry run complete: would remove {}, no changes made", target.name);
            }
            return Ok(());
        }

        self.gate(
            tracker,
            "Backup creation",
            "Snapshot world configs and the pack directory before removal.",
        )?;

        // Step 4: backup
        let backup = self
            .backups
            .create_uninstall_backup(Some(&target.name), &target.pack_id)
            .map_err(|e| Error::Other(format!("backup creation failed: {}", e)))?;
        result.backup = Some(backup.clone());

        tracker.step_completed(
            "Backup creation",
            &[format!("backup created with ID: {}", backup.id)],
        );
        self.gate(
            tracker,
            "Pack removal",
            "Deregister the pack and delete its directory.",
        )?;

        // Step 5: apply
        if let Err(e) = self.server.uninstall_pack(&target.pack_id) {
            let failure = Error::Other(format!("uninstallation failed: {}", e));
            return Err(self.rollback(&backup.id, "uninstallation", failure, result));
        }

        // Step 6: post-validation
        if let Err(e) = self.post_uninstall_validation(&target.pack_id) {
            return Err(self.rollback(&backup.id, "post-uninstallation validation", e, result));
        }

        result.removed_packs.push(target.name.clone());
        tracker.step_completed(
            "Pack removal",
            &[format!("removed pack: {}", target.name)],
        );

        if options.verbose {
            info!("successfully uninstalled pack: {}", target.name);
        }

        Ok(())
    }

    /// Resolve an identifier to exactly one installed pack.
    fn locate(&self, identifier: &str, selector: UninstallSelector) -> Result<InstalledPack> {
        let installed = self.server.installed_packs()?;

        match selector {
            UninstallSelector::UuidExact => {
                let wanted = normalize_uuid(identifier);
                installed
                    .into_iter()
                    .find(|p| normalize_uuid(&p.pack_id) == wanted)
                    .ok_or_else(|| {
                        Error::Conflict(format!("no pack found with UUID: {}", identifier))
                    })
            }
            UninstallSelector::NameSubstring => {
                let needle = identifier.to_lowercase();
                let mut matches: Vec<InstalledPack> = installed
                    .into_iter()
                    .filter(|p| {
                        p.name.to_lowercase().contains(&needle) || p.pack_id == identifier
                    })
                    .collect();

                if matches.len() > 1 {
                    let names: Vec<&str> = matches.iter().map(|p| p.name.as_str()).collect();
                    return Err(Error::Conflict(format!(
                        "multiple packs found matching '{}': {}. \
                         Use the UUID for precise identification",
                        identifier,
                        names.join(", ")
                    )));
                }

                matches.pop().ok_or_else(|| {
                    Error::Conflict(format!(
                        "no pack found with name containing: {}",
                        identifier
                    ))
                })
            }
        }
    }

    /// Names of installed packs whose manifests declare the target UUID.
    /// Unreadable manifests degrade the check, recorded on the result.
    fn dependents_of(&self, pack_id: &str, result: &mut UninstallResult) -> Vec<String> {
        let wanted = normalize_uuid(pack_id);
        let mut dependents = Vec::new();

        let installed = match self.server.installed_packs() {
            Ok(installed) => installed,
            Err(e) => {
                result.dependency_check_complete = false;
                result
                    .warnings
                    .push(format!("incomplete dependency check: {}", e));
                return dependents;
            }
        };

        for pack in installed {
            if normalize_uuid(&pack.pack_id) == wanted {
                continue;
            }

            let manifest = match self.server.find_manifest(&pack.pack_id, pack.pack_type) {
                Ok(manifest) => manifest,
                Err(e) => {
                    result.dependency_check_complete = false;
                    result.warnings.push(format!(
                        "incomplete dependency check: could not read manifest for {} ({}): {}",
                        pack.name, pack.pack_id, e
                    ));
                    continue;
                }
            };

            if manifest
                .pack_dependencies()
                .any(|(uuid, _)| normalize_uuid(uuid) == wanted)
            {
                dependents.push(pack.name.clone());
            }
        }

        dependents
    }

    fn post_uninstall_validation(&self, pack_id: &str) -> Result<()> {
        let wanted = normalize_uuid(pack_id);
        let installed = self.server.installed_packs()?;

        if installed
            .iter()
            .any(|p| normalize_uuid(&p.pack_id) == wanted)
        {
            return Err(Error::Validation(format!(
                "pack {} still appears in installed packs after removal",
                pack_id
            )));
        }

        Ok(())
    }

    fn rollback(
        &self,
        backup_id: &str,
        operation: &str,
        primary: Error,
        result: &mut UninstallResult,
    ) -> Error {
        match self.backups.restore_backup(backup_id) {
            Ok(()) => {
                result.rolled_back = true;
                result
                    .warnings
                    .push(format!("server state restored from backup {}", backup_id));
                primary
            }
            Err(restore_err) => {
                result
                    .errors
                    .push(format!("rollback failed: {}", restore_err));
                Error::Rollback {
                    operation: operation.to_string(),
                    source: Box::new(primary),
                    rollback: Box::new(restore_err),
                }
            }
        }
    }

    fn gate(&self, tracker: &dyn StepTracker, step: &str, description: &str) -> Result<()> {
        if tracker.confirm_next(step, description)? {
            Ok(())
        } else {
            Err(Error::Conflict(
                "uninstallation aborted by operator".to_string(),
            ))
        }
    }
}

fn impact_details(dependents: &[String], result: &UninstallResult) -> Vec<String> {
    let mut details = Vec::new();
    if dependents.is_empty() {
        details.push("no installed packs depend on this pack".to_string());
    } else {
        for dependent in dependents {
            details.push(format!("dependent pack: {}", dependent));
        }
    }
    if !result.dependency_check_complete {
        details.push("dependency check incomplete (unreadable manifests)".to_string());
    }
    details
}
