//! Takeoff CLI - reconcile, check and correct electrical drawing extractions.

use anyhow::Context;
use clap::Parser;
use takeoff_cli::commands;
use takeoff_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = Config::resolve_path(cli.config.as_deref())?;
    let config = Config::load_from(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Reconcile(args) => commands::execute_reconcile(args, &formatter)?,
        Command::Check(args) => commands::execute_check(args, &config, &formatter)?,
        Command::Correct(args) => commands::execute_correct(args, &formatter)?,
        Command::Extract(args) => commands::execute_extract(args, &config, &formatter)?,
        Command::Config(args) => commands::execute_config(args, &config, &config_path, &formatter)?,
    }

    Ok(())
}
