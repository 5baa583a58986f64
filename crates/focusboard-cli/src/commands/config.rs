//! Config file commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use focusboard_core::ClientConfig;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the config file location
    Path,
}

pub fn execute(cmd: ConfigCommands, explicit: Option<&Path>) -> Result<()> {
    match cmd {
        ConfigCommands::Show => {
            let mut config = ClientConfig::load(explicit)?;
            if config.token.is_some() {
                config.token = Some("********".to_string());
            }
            print!("{}", config.to_toml()?);
        }

        ConfigCommands::Init { force } => {
            let path = config_path(explicit)?;
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            ClientConfig::default().save(&path)?;
            println!(
                "{} Wrote {}",
                "✓".green().bold(),
                path.display().to_string().cyan()
            );
        }

        ConfigCommands::Path => {
            let path = config_path(explicit)?;
            let state = if path.exists() { "" } else { " (not created yet)" };
            println!("{}{}", path.display(), state.dimmed());
        }
    }

    Ok(())
}

fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(ClientConfig::default_path)
        .context("No config directory on this platform; pass --config")
}
