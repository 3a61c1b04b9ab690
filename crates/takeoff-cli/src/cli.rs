//! CLI command definitions and argument parsing.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Takeoff - reconcile and check electrical drawing extractions.
#[derive(Debug, Parser)]
#[command(name = "takeoff")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "TAKEOFF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (headline numbers only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Merge a directory of extraction payloads into one project
    Reconcile(ReconcileArgs),

    /// Run compliance rules and the cross-reference on a project
    Check(CheckArgs),

    /// Apply reviewer corrections to a project
    Correct(CorrectArgs),

    /// Run the provider-backed pipeline over a page manifest
    Extract(ExtractArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the reconcile command.
#[derive(Debug, Parser)]
pub struct ReconcileArgs {
    /// Directory of `*.json` payload files named by kind (`sld_1.json`, `lighting.json`, ...)
    pub dir: PathBuf,

    /// Pages in the drawing set; defaults to the number of payload files
    #[arg(short, long)]
    pub pages: Option<u32>,

    /// Building block names known up front
    #[arg(short, long, value_delimiter = ',')]
    pub blocks: Vec<String>,

    /// Project name; defaults to the directory name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Write the merged project as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the check command.
#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// Project JSON file
    pub project: PathBuf,

    /// Exit with an error when critical issues exist
    #[arg(long)]
    pub deny_critical: bool,
}

/// Arguments for the correct command.
#[derive(Debug, Parser)]
pub struct CorrectArgs {
    /// Project JSON file
    pub project: PathBuf,

    /// JSON array of corrections
    pub corrections: PathBuf,

    /// Write the corrected project as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the correction log as JSON
    #[arg(long)]
    pub log: Option<PathBuf>,
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// TOML manifest listing the pages
    pub manifest: PathBuf,

    /// Write the extracted project as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for config management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config management actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_reconcile_command() {
        let cli = Cli::parse_from([
            "takeoff",
            "reconcile",
            "drawings/",
            "--pages",
            "12",
            "--blocks",
            "Main House,Cottage",
            "-o",
            "project.json",
        ]);
        match cli.command {
            Command::Reconcile(args) => {
                assert_eq!(args.pages, Some(12));
                assert_eq!(args.blocks, vec!["Main House", "Cottage"]);
                assert_eq!(args.output, Some(PathBuf::from("project.json")));
            }
            _ => panic!("Expected Reconcile command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["takeoff", "check", "p.json", "--deny-critical", "-vv", "--format", "json"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.format, Some(CliFormat::Json));
        match cli.command {
            Command::Check(args) => assert!(args.deny_critical),
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_config_init() {
        let cli = Cli::parse_from(["takeoff", "config", "init", "--force"]);
        assert!(matches!(
            cli.command,
            Command::Config(ConfigArgs {
                action: ConfigAction::Init { force: true }
            })
        ));
    }
}
