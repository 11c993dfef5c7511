// src/addon/installer.rs

//! Addon installation pipeline
//!
//! A fixed ten-step sequence: validate, extract, content-validate, conflict
//! check, dependency check, dry-run short-circuit, backup, apply,
//! post-validate, success. Steps are strictly sequential; the first fatal
//! error aborts the pipeline, and any failure after the backup step
//! restores from it. Conflicts and missing dependencies refuse the install
//! unless force mode is on, in which case they become warnings.

use crate::addon::backup::AddonBackups;
use crate::addon::dependencies::unsatisfied_dependencies;
use crate::addon::extractor::{self, ExtractedAddon};
use crate::addon::simulator;
use crate::archive::ArchiveLimits;
use crate::error::{Error, Result};
use crate::filesystem::backup::BackupMetadata;
use crate::progress::{SilentSteps, StepTracker};
use crate::server::Server;
use crate::validation::normalize_uuid;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Options controlling one install invocation
#[derive(Clone)]
pub struct InstallOptions {
    /// Analyze and simulate without mutating the server
    pub dry_run: bool,
    /// Proceed despite UUID conflicts or missing dependencies
    pub force: bool,
    /// Mirror per-step progress to the diagnostic stream
    pub verbose: bool,
    /// Archive extraction policy
    pub limits: ArchiveLimits,
    /// Step observer and interactive gate
    pub tracker: Arc<dyn StepTracker>,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            force: false,
            verbose: false,
            limits: ArchiveLimits::default(),
            tracker: Arc::new(SilentSteps::new()),
        }
    }
}

/// Structured outcome of an install
///
/// Warnings and errors are first-class here so callers can decide
/// programmatically; `success` is false whenever `errors` is non-empty.
#[derive(Debug, Clone, Default)]
pub struct InstallResult {
    pub success: bool,
    pub installed_packs: Vec<String>,
    pub backup: Option<BackupMetadata>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// True when a failure was undone by restoring the backup
    pub rolled_back: bool,
    /// Dry-run plan lines, present only for dry runs
    pub simulated_operations: Vec<String>,
}

/// Orchestrates addon installs against one server
pub struct Installer<'a> {
    server: &'a Server,
    backups: AddonBackups<'a>,
}

impl<'a> Installer<'a> {
    pub fn new(server: &'a Server, backup_root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            server,
            backups: AddonBackups::new(server, backup_root),
        }
    }

    /// Install an addon archive. Never panics on operational failure: the
    /// result carries errors and warnings either way.
    pub fn install(&self, addon_path: &Path, options: &InstallOptions) -> InstallResult {
        let mut result = InstallResult::default();

        match self.run(addon_path, options, &mut result) {
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
        addon_path: &Path,
        options: &InstallOptions,
        result: &mut InstallResult,
    ) -> Result<()> {
        let tracker = options.tracker.as_ref();

        if options.verbose {
            info!("starting installation of {}", addon_path.display());
        }

        // Step 1: pre-validation
        extractor::validate_addon_file(addon_path)
            .map_err(|e| Error::Validation(format!("pre-installation validation failed: {}", e)))?;
        self.server
            .layout()
            .validate_structure()
            .map_err(|e| Error::Layout(format!("server validation failed: {}", e)))?;

        tracker.step_completed(
            "Pre-installation validation",
            &[
                format!("validated addon file: {}", addon_path.display()),
                format!(
                    "server directory structure verified: {}",
                    self.server.layout().server_root.display()
                ),
            ],
        );
        self.gate(
            tracker,
            "Archive extraction",
            "Extract the addon archive and any nested packs to a scratch directory.",
        )?;

        // Step 2: extraction (scratch cleanup bound to the value)
        let addon = extractor::extract_addon(addon_path, options.dry_run, &options.limits)
            .map_err(|e| Error::Validation(format!("extraction failed: {}", e)))?;

        tracker.step_completed("Archive extraction", &extraction_details(&addon));
        self.gate(
            tracker,
            "Content validation",
            "Validate every extracted manifest and classify pack types.",
        )?;

        // Step 3: content validation
        if addon.pack_count() == 0 {
            return Err(Error::Validation("no valid packs found in addon".to_string()));
        }
        for pack in addon.all_packs() {
            pack.manifest.validate().map_err(|e| {
                Error::Validation(format!(
                    "manifest validation failed for pack {}: {}",
                    pack.manifest.display_name(),
                    e
                ))
            })?;
        }

        tracker.step_completed(
            "Content validation",
            &[format!("{} pack manifest(s) valid", addon.pack_count())],
        );
        self.gate(
            tracker,
            "Conflict detection",
            "Check for UUID conflicts and missing dependencies against installed packs.",
        )?;

        // Steps 4 and 5: conflicts and dependency satisfaction
        let installed = self.server.installed_packs()?;

        let mut conflicts = Vec::new();
        for pack in addon.all_packs() {
            let incoming_id = normalize_uuid(&pack.manifest.header.uuid);
            for existing in &installed {
                if normalize_uuid(&existing.pack_id) == incoming_id {
                    conflicts.push(format!(
                        "pack {} (UUID: {}) is already installed",
                        existing.name, existing.pack_id
                    ));
                }
            }
        }

        let incoming: Vec<_> = addon.all_packs().map(|p| &p.manifest).collect();
        let missing = unsatisfied_dependencies(&incoming, &installed);

        for conflict in &conflicts {
            result.warnings.push(format!("conflict detected: {}", conflict));
        }
        for dep in &missing {
            result.warnings.push(format!("missing dependency: {}", dep));
        }
        if options.verbose {
            for warning in &result.warnings {
                warn!("{}", warning);
            }
        }

        tracker.step_completed("Conflict detection", &conflict_details(&conflicts, &missing));
        self.gate(
            tracker,
            "Backup creation",
            "Snapshot world configuration files so a failed install can be rolled back.",
        )?;

        if !conflicts.is_empty() && !options.force {
            return Err(Error::Conflict(
                "conflicts detected, use --force to override".to_string(),
            ));
        }
        if !missing.is_empty() && !options.force {
            return Err(Error::Dependency(
                "missing dependencies detected; install required packs first \
                 or use --force to proceed anyway"
                    .to_string(),
            ));
        }

        // Step 6: dry-run short-circuit
        if options.dry_run {
            return self.simulate(&addon, options, result);
        }

        // Step 7: backup
        let (addon_name, addon_uuid) = addon
            .all_packs()
            .next()
            .map(|p| {
                (
                    p.manifest.display_name(),
                    normalize_uuid(&p.manifest.header.uuid),
                )
            })
            .unzip();
        let backup = self
            .backups
            .create_install_backup(addon_name.as_deref(), addon_uuid.as_deref())
            .map_err(|e| Error::Other(format!("backup creation failed: {}", e)))?;
        result.backup = Some(backup.clone());

        tracker.step_completed(
            "Backup creation",
            &[
                format!("backup created with ID: {}", backup.id),
                format!("backup stored at: {}", backup.backup_path.display()),
            ],
        );
        self.gate(
            tracker,
            "Pack installation",
            "Copy pack files into the server and register them in the world configs.",
        )?;

        // Step 8: apply, tracking the directories this run creates so a
        // rollback can remove them (the backup only covers the configs)
        let mut created_dirs = Vec::new();
        for pack in addon.all_packs() {
            if options.verbose {
                info!(
                    "installing {} pack: {}",
                    pack.pack_type,
                    pack.manifest.display_name()
                );
            }

            let (target_dir, _) = self.server.pack_target(pack.pack_type)?;
            let final_dir = target_dir.join(Server::pack_dir_name(&pack.manifest));
            let preexisting = final_dir.exists();

            if let Err(e) = self.server.install_pack(&pack.manifest, &pack.path) {
                let failure = Error::Other(format!(
                    "failed to install pack {}: {}",
                    pack.manifest.display_name(),
                    e
                ));
                return Err(self.rollback(&backup.id, "installation", failure, &created_dirs, result));
            }

            if !preexisting {
                created_dirs.push(final_dir);
            }
        }

        tracker.step_completed("Pack installation", &installed_details(&addon, self.server));
        self.gate(
            tracker,
            "Post-installation validation",
            "Verify every new pack is registered with the server.",
        )?;

        // Step 9: post-validation
        if let Err(e) = self.post_install_validation(&addon) {
            return Err(self.rollback(
                &backup.id,
                "post-installation validation",
                e,
                &created_dirs,
                result,
            ));
        }

        // Step 10: success
        for pack in addon.all_packs() {
            result.installed_packs.push(pack.manifest.display_name());
        }
        tracker.step_completed(
            "Post-installation validation",
            &[format!("{} pack(s) registered", result.installed_packs.len())],
        );

        if options.verbose {
            info!("successfully installed {} pack(s)", result.installed_packs.len());
        }

        Ok(())
    }

    fn simulate(
        &self,
        addon: &ExtractedAddon,
        options: &InstallOptions,
        result: &mut InstallResult,
    ) -> Result<()> {
        for pack in addon.all_packs() {
            let sim = simulator::simulate_install(self.server, pack)?;
            result.simulated_operations.extend(sim.detail_lines());
            result.installed_packs.push(sim.pack_name);
        }

        options
            .tracker
            .step_completed("Installation simulation", &result.simulated_operations);

        if options.verbose {
            info!(
                "dry run complete: would install {} pack(s), no changes made",
                result.installed_packs.len()
            );
        }

        Ok(())
    }

    fn post_install_validation(&self, addon: &ExtractedAddon) -> Result<()> {
        let installed = self.server.installed_packs()?;
        let installed_ids: HashSet<String> = installed
            .iter()
            .map(|p| normalize_uuid(&p.pack_id))
            .collect();

        for pack in addon.all_packs() {
            let id = normalize_uuid(&pack.manifest.header.uuid);
            if !installed_ids.contains(&id) {
                return Err(Error::Validation(format!(
                    "pack {} was not found in installed packs after installation",
                    pack.manifest.display_name()
                )));
            }
        }

        Ok(())
    }

    /// Restore the backup after a failed step. Pack directories created by
    /// this run are removed first (the snapshot does not cover them). The
    /// primary error always propagates; a failed restore is reported
    /// alongside it, never instead of it.
    fn rollback(
        &self,
        backup_id: &str,
        operation: &str,
        primary: Error,
        created_dirs: &[std::path::PathBuf],
        result: &mut InstallResult,
    ) -> Error {
        for dir in created_dirs {
            if let Err(e) = std::fs::remove_dir_all(dir) {
                warn!("failed to remove {} during rollback: {}", dir.display(), e);
            }
        }

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
            Err(Error::Conflict("installation aborted by operator".to_string()))
        }
    }
}

fn extraction_details(addon: &ExtractedAddon) -> Vec<String> {
    let mut details = vec![format!(
        "extracted to scratch directory: {}",
        addon.scratch_dir().display()
    )];
    for pack in addon.all_packs() {
        details.push(format!(
            "found {} pack: {} (UUID: {}, Version: {})",
            pack.pack_type,
            pack.manifest.display_name(),
            pack.manifest.header.uuid,
            pack.manifest.header.version
        ));
    }
    details
}

fn conflict_details(
    conflicts: &[String],
    missing: &[crate::addon::dependencies::MissingDependency],
) -> Vec<String> {
    let mut details = Vec::new();
    if conflicts.is_empty() {
        details.push("no UUID conflicts detected".to_string());
    } else {
        for conflict in conflicts {
            details.push(format!("conflict: {}", conflict));
        }
    }
    if missing.is_empty() {
        details.push("all dependencies satisfied".to_string());
    } else {
        for dep in missing {
            details.push(format!("missing dependency: {}", dep));
        }
    }
    details
}

fn installed_details(addon: &ExtractedAddon, server: &Server) -> Vec<String> {
    let mut details = Vec::new();
    for pack in addon.all_packs() {
        if let Ok((target_dir, config_file)) = server.pack_target(pack.pack_type) {
            details.push(format!(
                "created pack directory: {}",
                target_dir.join(Server::pack_dir_name(&pack.manifest)).display()
            ));
            details.push(format!("updated world config: {}", config_file.display()));
        }
    }
    details
}
