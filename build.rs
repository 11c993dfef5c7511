// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: server root directory
fn server_arg() -> Arg {
    Arg::new("server")
        .required(true)
        .help("Server root directory")
}

fn build_cli() -> Command {
    Command::new("addonctl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Addon administrator for Minecraft Bedrock dedicated servers")
        .subcommand_required(false)
        .subcommand(
            Command::new("install")
                .about("Install an addon (.mcaddon or .mcpack) onto a server")
                .arg(Arg::new("addon").required(true).help("Path to the addon archive"))
                .arg(server_arg())
                .arg(
                    Arg::new("dry_run")
                        .long("dry-run")
                        .action(clap::ArgAction::SetTrue)
                        .help("Show what would be installed without making changes"),
                )
                .arg(
                    Arg::new("force")
                        .short('f')
                        .long("force")
                        .action(clap::ArgAction::SetTrue)
                        .help("Proceed despite UUID conflicts or missing dependencies"),
                )
                .arg(
                    Arg::new("interactive")
                        .short('i')
                        .long("interactive")
                        .action(clap::ArgAction::SetTrue)
                        .help("Pause for confirmation between steps"),
                )
                .arg(
                    Arg::new("backup_dir")
                        .long("backup-dir")
                        .help("Backup directory (default: <server>/backups)"),
                )
                .arg(
                    Arg::new("max_file_size")
                        .long("max-file-size")
                        .help("Per-file decompression limit in bytes"),
                ),
        )
        .subcommand(
            Command::new("uninstall")
                .about("Remove an installed addon")
                .arg(
                    Arg::new("identifier")
                        .required(true)
                        .help("Pack name fragment, or UUID with --uuid"),
                )
                .arg(server_arg())
                .arg(
                    Arg::new("uuid")
                        .long("uuid")
                        .action(clap::ArgAction::SetTrue)
                        .help("Treat the identifier as an exact UUID"),
                )
                .arg(
                    Arg::new("dry_run")
                        .long("dry-run")
                        .action(clap::ArgAction::SetTrue)
                        .help("Show what would be removed without making changes"),
                )
                .arg(
                    Arg::new("force")
                        .short('f')
                        .long("force")
                        .action(clap::ArgAction::SetTrue)
                        .help("Remove even when other packs depend on the target"),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("List installed addons")
                .arg(server_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(clap::ArgAction::SetTrue)
                        .help("Output in JSON format"),
                )
                .arg(
                    Arg::new("tree")
                        .long("tree")
                        .action(clap::ArgAction::SetTrue)
                        .help("Show the dependency tree"),
                ),
        )
        .subcommand(Command::new("version").about("Show version information"))
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish", "powershell"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("addonctl.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
