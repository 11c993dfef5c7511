// src/commands/install.rs
//! Addon installation command

use super::prompt::InteractivePrompt;
use addonctl::addon::AddonBackups;
use addonctl::{
    ArchiveLimits, InstallOptions, Installer, LogSteps, Server, SilentSteps, StepTracker,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Install flags collected from the CLI
pub struct InstallFlags {
    pub dry_run: bool,
    pub force: bool,
    pub verbose: bool,
    pub interactive: bool,
    pub backup_dir: Option<PathBuf>,
    pub max_file_size: Option<u64>,
}

/// Install an addon archive onto a server
pub fn cmd_install(addon: &Path, server_root: &Path, flags: InstallFlags) -> Result<()> {
    info!("installing {} onto {}", addon.display(), server_root.display());

    let server = Server::open(server_root)
        .with_context(|| format!("failed to open server at {}", server_root.display()))?;

    let backup_root = flags
        .backup_dir
        .unwrap_or_else(|| AddonBackups::default_root(&server));
    let installer = Installer::new(&server, backup_root);

    let tracker: Arc<dyn StepTracker> = if flags.interactive {
        Arc::new(InteractivePrompt::new())
    } else if flags.verbose {
        Arc::new(LogSteps::new())
    } else {
        Arc::new(SilentSteps::new())
    };

    let mut limits = ArchiveLimits::default();
    if let Some(max) = flags.max_file_size {
        limits.max_file_size = max;
    }

    let options = InstallOptions {
        dry_run: flags.dry_run,
        force: flags.force,
        verbose: flags.verbose,
        limits,
        tracker,
    };

    let result = installer.install(addon, &options);

    for warning in &result.warnings {
        eprintln!("WARNING: {}", warning);
    }

    if !result.success {
        for error in &result.errors {
            eprintln!("ERROR: {}", error);
        }
        anyhow::bail!("installation failed");
    }

    if flags.dry_run {
        println!("Dry run complete - no changes were made to the server");
        for line in &result.simulated_operations {
            println!("  {}", line);
        }
        println!(
            "Would install {} pack(s): {}",
            result.installed_packs.len(),
            result.installed_packs.join(", ")
        );
    } else {
        println!("Installed {} pack(s):", result.installed_packs.len());
        for pack in &result.installed_packs {
            println!("  - {}", pack);
        }
        if let Some(backup) = &result.backup {
            println!("Backup created: {}", backup.id);
        }
    }

    Ok(())
}
