mod descriptor;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use stowpack_installer::{
    read_manifests, InstallerOptions, JsonRecordStore, PlatformInstaller, StorageLayout,
};
use tracing_subscriber::EnvFilter;

use crate::descriptor::load_descriptor;
use crate::render::{current_output_style, render_status_line};

#[derive(Parser, Debug)]
#[command(name = "stowpack")]
#[command(about = "Platform package placement for a host package manager", long_about = None)]
struct Cli {
    /// Platform storage root.
    #[arg(long, default_value = "storage")]
    root: PathBuf,
    /// Directory where package symlinks are published.
    #[arg(long, default_value = "web")]
    web_root: PathBuf,
    /// Registration store file; defaults to <root>/.manifest/registry.json.
    #[arg(long)]
    records: Option<PathBuf>,
    /// Managed-host marker file to check before touching the tree.
    #[arg(long)]
    marker: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Place a package described by a descriptor file.
    Install { descriptor: PathBuf },
    /// Replace one placed package version with another.
    Update {
        previous: PathBuf,
        descriptor: PathBuf,
    },
    /// Remove a placed package.
    Uninstall { descriptor: PathBuf },
    /// Print the install path a descriptor would resolve to.
    Path { descriptor: PathBuf },
    /// Report whether a package type is handled.
    Supports { package_type: String },
    /// List placed package manifests.
    List,
    /// Print the effective layout and environment checks.
    Doctor,
    /// Generate shell completions.
    Completions { shell: Shell },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run_cli(cli)
}

fn run_cli(cli: Cli) -> Result<()> {
    let style = current_output_style();

    match cli.command {
        Commands::Install { ref descriptor } => {
            let descriptor = load_descriptor(&descriptor)?;
            let mut installer = build_installer(&cli)?;
            let outcome = installer.on_install(&descriptor)?;

            println!(
                "{}",
                render_status_line(
                    style,
                    "ok",
                    &format!(
                        "installed {} {} at {}",
                        descriptor.full_name(),
                        descriptor.version(),
                        outcome.install_path.display()
                    ),
                )
            );
            for link in &outcome.links {
                println!(
                    "{}",
                    render_status_line(
                        style,
                        "step",
                        &format!("linked {} -> {}", link.link.display(), link.target.display()),
                    )
                );
            }
            if !outcome.registered {
                println!(
                    "{}",
                    render_status_line(style, "warn", "registration failed; package placed anyway")
                );
            }
        }
        Commands::Update {
            ref previous,
            ref descriptor,
        } => {
            let previous = load_descriptor(&previous)?;
            let target = load_descriptor(&descriptor)?;
            let mut installer = build_installer(&cli)?;
            let outcome = installer.on_update(&previous, &target)?;

            println!(
                "{}",
                render_status_line(
                    style,
                    "ok",
                    &format!(
                        "updated {} {} -> {} at {}",
                        target.full_name(),
                        previous.version(),
                        target.version(),
                        outcome.install_path.display()
                    ),
                )
            );
        }
        Commands::Uninstall { ref descriptor } => {
            let descriptor = load_descriptor(&descriptor)?;
            let mut installer = build_installer(&cli)?;
            let outcome = installer.on_uninstall(&descriptor)?;

            println!(
                "{}",
                render_status_line(
                    style,
                    "ok",
                    &format!(
                        "removed {} {}; package files remain at {}",
                        descriptor.full_name(),
                        descriptor.version(),
                        outcome.install_path.display()
                    ),
                )
            );
        }
        Commands::Path { ref descriptor } => {
            let descriptor = load_descriptor(&descriptor)?;
            let mut installer = build_installer(&cli)?;
            println!("{}", installer.install_path(&descriptor)?.display());
        }
        Commands::Supports { ref package_type } => {
            let installer = build_installer(&cli)?;
            if installer.supports(&package_type) {
                println!("{package_type}: supported");
            } else {
                println!("{package_type}: not supported");
            }
        }
        Commands::List => {
            let installer = build_installer(&cli)?;
            let manifests = read_manifests(installer.layout(), installer.types());
            if manifests.is_empty() {
                println!("no packages placed");
            }
            for manifest in manifests {
                let name = manifest["name"].as_str().unwrap_or("<unnamed>");
                let version = manifest["version"].as_str().unwrap_or("?");
                let package_type = manifest["type"].as_str().unwrap_or("?");
                println!("{name} {version} ({package_type})");
            }
        }
        Commands::Doctor => {
            let marker = marker_path(&cli);
            println!("storage root: {}", cli.root.display());
            println!("web root: {}", cli.web_root.display());
            println!("records: {}", records_path(&cli).display());
            if marker.exists() {
                println!(
                    "{}",
                    render_status_line(
                        style,
                        "err",
                        &format!("managed host marker present: {}", marker.display()),
                    )
                );
            } else {
                println!(
                    "{}",
                    render_status_line(
                        style,
                        "ok",
                        &format!("managed host marker absent: {}", marker.display()),
                    )
                );
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "stowpack", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn build_installer(cli: &Cli) -> Result<PlatformInstaller<JsonRecordStore>> {
    let layout = StorageLayout::new(cli.root.clone(), cli.web_root.clone());
    let store = JsonRecordStore::new(records_path(cli));
    let installer = PlatformInstaller::with_options(
        layout,
        store,
        InstallerOptions {
            managed_host_marker: marker_path(cli),
        },
    )?;
    Ok(installer)
}

fn records_path(cli: &Cli) -> PathBuf {
    cli.records
        .clone()
        .unwrap_or_else(|| cli.root.join(".manifest").join("registry.json"))
}

fn marker_path(cli: &Cli) -> PathBuf {
    cli.marker
        .clone()
        .unwrap_or_else(|| PathBuf::from(stowpack_installer::DEFAULT_MANAGED_HOST_MARKER))
}
