//! CLI module for awplus-reconcile
//!
//! This module provides the command-line interface, including argument
//! parsing and subcommand handling.

pub mod commands;
pub mod diff;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// awplus-reconcile - compute AlliedWare Plus configuration commands
///
/// Compares a desired resource configuration with the device's current one
/// and prints the ordered CLI commands that reconcile them. Nothing is ever
/// sent to a device.
#[derive(Parser, Debug, Clone)]
#[command(name = "awplus-reconcile")]
#[command(author = "awplus-resources Contributors")]
#[command(version)]
#[command(about = "Compute AlliedWare Plus configuration commands", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Show a before/after diff of the resource
    #[arg(long = "diff", global = true)]
    pub diff_mode: bool,

    /// Output format (defaults to the configured one)
    #[arg(long, global = true)]
    pub output: Option<OutputFormat>,

    /// Path to configuration file
    #[arg(short = 'c', long = "config-file", global = true, env = "AWPLUS_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output for scripting
    Json,
    /// YAML output
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compute the commands that move a resource to the desired state
    Reconcile(commands::reconcile::ReconcileArgs),

    /// List the available resource modules
    List(commands::list::ListArgs),
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "awplus-reconcile",
            "reconcile",
            "vxlan",
            "--state",
            "overridden",
            "--config",
            "want.yml",
        ])
        .unwrap();
        match cli.command {
            Commands::Reconcile(args) => {
                assert_eq!(args.resource, "vxlan");
                assert_eq!(args.config, PathBuf::from("want.yml"));
                assert!(args.facts.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["awplus-reconcile", "-vvvv", "list"]).unwrap();
        assert_eq!(cli.verbosity(), 3);
    }

    #[test]
    fn test_output_format() {
        let cli = Cli::try_parse_from(["awplus-reconcile", "--output", "json", "list"]).unwrap();
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert_eq!("YAML".parse::<OutputFormat>(), Ok(OutputFormat::Yaml));
    }
}
