//! Configuration view and validation commands: `refer-earn config`.

use anyhow::Result;
use std::path::{Path, PathBuf};

use super::super::ConfigCommands;
use refer_earn::config::{CONFIG_FILE_NAME, ReferConfig, ReferToml};

pub fn cmd_config(
    config_path: Option<&Path>,
    cli_backend_url: Option<&str>,
    command: Option<ConfigCommands>,
) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            let config = ReferConfig::load(config_path, cli_backend_url)?;

            println!();
            println!("Refer & Earn Configuration");
            println!("==========================");
            println!();

            match &config.source {
                Some(path) => println!("Config file: {}", path.display()),
                None => {
                    println!("No {} found. Using default configuration.", CONFIG_FILE_NAME)
                }
            }
            println!();

            let toml = &config.toml;
            println!("[backend]");
            println!("  base_url = \"{}\"", toml.backend.base_url);
            println!("  timeout_secs = {}", toml.backend.timeout_secs);
            println!();
            println!("[rewards]");
            println!("  referrer = \"{}\"", toml.rewards.referrer);
            println!("  referee = \"{}\"", toml.rewards.referee);
            println!();
            println!("[sandbox]");
            println!("  host = \"{}\"", toml.sandbox.host);
            println!("  port = {}", toml.sandbox.port);
            println!();

            // Show effective values (including env overrides)
            println!("Effective values (with env/CLI overrides):");
            println!("  backend_url = \"{}\"", config.backend_url);
            println!("  timeout_secs = {}", config.timeout.as_secs());
            println!();

            if config.source.is_none() {
                println!("Run 'refer-earn config init' to create a {} file.", CONFIG_FILE_NAME);
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let config = ReferConfig::load(config_path, cli_backend_url)?;
            if config.source.is_none() {
                println!("No {} found. Using defaults.", CONFIG_FILE_NAME);
            }

            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            let path = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

            if path.exists() {
                println!("{} already exists at {}", CONFIG_FILE_NAME, path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                std::fs::create_dir_all(parent)?;
            }

            ReferToml::default().save(&path)?;

            println!("Created {} at {}", CONFIG_FILE_NAME, path.display());
            println!();
            println!("You can now customize:");
            println!("  - [backend] base_url, timeout_secs");
            println!("  - [rewards] referrer, referee");
            println!("  - [sandbox] host, port");
            println!();
        }
    }

    Ok(())
}
