// src/main.rs
//! addonctl - CLI entry point

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

mod commands;

// =============================================================================
// CLI Definitions
// =============================================================================

#[derive(Parser)]
#[command(name = "addonctl")]
#[command(version)]
#[command(about = "Addon administrator for Minecraft Bedrock dedicated servers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install an addon (.mcaddon or .mcpack) onto a server
    Install {
        /// Path to the addon archive
        addon: PathBuf,

        /// Server root directory
        server: PathBuf,

        /// Show what would be installed without making changes
        #[arg(long)]
        dry_run: bool,

        /// Proceed despite UUID conflicts or missing dependencies
        #[arg(short, long)]
        force: bool,

        /// Emit per-step progress
        #[arg(short, long)]
        verbose: bool,

        /// Pause for confirmation between steps
        #[arg(short, long)]
        interactive: bool,

        /// Backup directory (default: <server>/backups)
        #[arg(long)]
        backup_dir: Option<PathBuf>,

        /// Per-file decompression limit in bytes
        #[arg(long)]
        max_file_size: Option<u64>,
    },

    /// Remove an installed addon
    Uninstall {
        /// Pack name fragment, or UUID with --uuid
        identifier: String,

        /// Server root directory
        server: PathBuf,

        /// Treat the identifier as an exact UUID
        #[arg(long)]
        uuid: bool,

        /// Show what would be removed without making changes
        #[arg(long)]
        dry_run: bool,

        /// Remove even when other packs depend on the target
        #[arg(short, long)]
        force: bool,

        /// Refuse removal when dependents exist (unless forced)
        #[arg(long)]
        block_on_dependents: bool,

        /// Emit per-step progress
        #[arg(short, long)]
        verbose: bool,

        /// Pause for confirmation between steps
        #[arg(short, long)]
        interactive: bool,

        /// Backup directory (default: <server>/backups)
        #[arg(long)]
        backup_dir: Option<PathBuf>,
    },

    /// List installed addons
    List {
        /// Server root directory
        server: PathBuf,

        /// Output in JSON format
        #[arg(long)]
        json: bool,

        /// Group packs by dependency relationships
        #[arg(long)]
        grouped: bool,

        /// Show the dependency tree
        #[arg(long)]
        tree: bool,

        /// Show only standalone packs
        #[arg(long)]
        standalone: bool,

        /// Show only root packs (packs that others depend on)
        #[arg(long)]
        roots: bool,
    },

    /// Show version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Install {
            addon,
            server,
            dry_run,
            force,
            verbose,
            interactive,
            backup_dir,
            max_file_size,
        }) => commands::cmd_install(
            &addon,
            &server,
            commands::InstallFlags {
                dry_run,
                force,
                verbose,
                interactive,
                backup_dir,
                max_file_size,
            },
        ),

        Some(Commands::Uninstall {
            identifier,
            server,
            uuid,
            dry_run,
            force,
            block_on_dependents,
            verbose,
            interactive,
            backup_dir,
        }) => commands::cmd_uninstall(
            &identifier,
            &server,
            commands::UninstallFlags {
                by_uuid: uuid,
                dry_run,
                force,
                block_on_dependents,
                verbose,
                interactive,
                backup_dir,
            },
        ),

        Some(Commands::List {
            server,
            json,
            grouped,
            tree,
            standalone,
            roots,
        }) => commands::cmd_list(&server, json, grouped, tree, standalone, roots),

        Some(Commands::Version) => {
            println!("addonctl version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }

        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "addonctl", &mut io::stdout());
            Ok(())
        }

        None => {
            println!("addonctl v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'addonctl --help' for usage information");
            Ok(())
        }
    }
}
