// src/commands/uninstall.rs
//! Addon removal command

use super::prompt::InteractivePrompt;
use addonctl::addon::AddonBackups;
use addonctl::{
    LogSteps, Server, SilentSteps, StepTracker, UninstallOptions, UninstallSelector, Uninstaller,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Uninstall flags collected from the CLI
pub struct UninstallFlags {
    pub by_uuid: bool,
    pub dry_run: bool,
    pub force: bool,
    pub block_on_dependents: bool,
    pub verbose: bool,
    pub interactive: bool,
    pub backup_dir: Option<PathBuf>,
}

/// Remove an addon by name fragment or UUID
pub fn cmd_uninstall(identifier: &str, server_root: &Path, flags: UninstallFlags) -> Result<()> {
    info!("uninstalling {} from {}", identifier, server_root.display());

    let server = Server::open(server_root)
        .with_context(|| format!("failed to open server at {}", server_root.display()))?;

    let backup_root = flags
        .backup_dir
        .unwrap_or_else(|| AddonBackups::default_root(&server));
    let uninstaller = Uninstaller::new(&server, backup_root);

    let tracker: Arc<dyn StepTracker> = if flags.interactive {
        Arc::new(InteractivePrompt::new())
    } else if flags.verbose {
        Arc::new(LogSteps::new())
    } else {
        Arc::new(SilentSteps::new())
    };

    let options = UninstallOptions {
        dry_run: flags.dry_run,
        verbose: flags.verbose,
        selector: if flags.by_uuid {
            UninstallSelector::UuidExact
        } else {
            UninstallSelector::NameSubstring
        },
        block_on_dependents: flags.block_on_dependents,
        force: flags.force,
        tracker,
    };

    let result = uninstaller.uninstall(identifier, &options);

    for warning in &result.warnings {
        eprintln!("WARNING: {}", warning);
    }
    if !result.dependency_check_complete {
        eprintln!("WARNING: dependency check was incomplete; dependent packs may be missed");
    }

    if !result.success {
        for error in &result.errors {
            eprintln!("ERROR: {}", error);
        }
        anyhow::bail!("uninstallation failed");
    }

    if flags.dry_run {
        println!("Dry run complete - no changes were made to the server");
        for line in &result.simulated_operations {
            println!("  {}", line);
        }
    } else {
        println!("Removed {} pack(s):", result.removed_packs.len());
        for pack in &result.removed_packs {
            println!("  - {}", pack);
        }
        if let Some(backup) = &result.backup {
            println!("Backup created: {}", backup.id);
        }
    }

    Ok(())
}
