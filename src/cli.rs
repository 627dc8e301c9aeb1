//! Command-line entry points.

use std::path::PathBuf;
use std::process::Command as ProcessCommand;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::{BuildConfig, DEFAULT_CONFIG_FILE};
use crate::update::update_document;
use crate::walk::NoopChecker;

#[derive(Parser)]
#[command(name = "odfpack", version, about = "Pack Python macro scripts into ODF documents")]
pub struct Cli {
    /// Project configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the destination document.
    Update,
    /// Build with a generated body holding one launcher button per
    /// exported function.
    Debug,
    /// Build, then open the destination document in the configured
    /// office application.
    Run,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = BuildConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let base = cli
        .config
        .parent()
        .map(PathBuf::from)
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from("."));

    match cli.command {
        Command::Update => {
            let dest = update_document(&config, &base, &NoopChecker, false)?;
            info!(dest = %dest.display(), "document updated");
        }
        Command::Debug => {
            let dest = update_document(&config, &base, &NoopChecker, true)?;
            info!(dest = %dest.display(), "debug document written");
        }
        Command::Run => {
            let dest = update_document(&config, &base, &NoopChecker, false)?;
            let Some(exe) = &config.office_exe else {
                bail!("no office_exe configured, cannot open {}", dest.display());
            };
            info!(exe = %exe.display(), dest = %dest.display(), "launching");
            let status = ProcessCommand::new(exe)
                .arg(&dest)
                .status()
                .with_context(|| format!("launching {}", exe.display()))?;
            if !status.success() {
                bail!("{} exited with {}", exe.display(), status);
            }
        }
    }
    Ok(())
}
