//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::{Config, OutputFormat};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::path::Path;

/// Execute the config command.
pub fn execute_config(args: ConfigArgs, config: &Config, path: &Path, formatter: &Formatter) -> Result<()> {
    match args.action {
        ConfigAction::Show => show_config(config, path, formatter),
        ConfigAction::Init { force } => init_config(path, force, formatter),
    }
}

/// Print the effective configuration.
fn show_config(config: &Config, path: &Path, formatter: &Formatter) -> Result<()> {
    match formatter.format() {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Quiet => println!("{}", path.display()),
        OutputFormat::Table => {
            if !path.exists() {
                println!("{}", formatter.info(&format!("{} not found; showing defaults", path.display())));
            }
            println!("{}", config.to_toml()?);
        }
    }
    Ok(())
}

/// Write a default configuration file.
pub fn init_config(path: &Path, force: bool, formatter: &Formatter) -> Result<()> {
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        )));
    }
    Config::default().save_to(path)?;
    println!("{}", formatter.success(&format!("Configuration written to {}", path.display())));
    Ok(())
}
