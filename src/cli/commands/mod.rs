//! Subcommands module for awplus-reconcile
//!
//! This module contains all the subcommand implementations.

pub mod list;
pub mod reconcile;

use crate::cli::output::OutputFormatter;
use crate::cli::{Cli, OutputFormat};
use awplus_resources::config::Config;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
    /// Diff mode
    pub diff_mode: bool,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &Cli, config: Config) -> Self {
        let format = cli
            .output
            .or_else(|| config.defaults.output.parse().ok())
            .unwrap_or(OutputFormat::Human);
        let use_color = !cli.no_color && config.colors.enabled;
        let output = OutputFormatter::new(use_color, format, cli.verbosity());

        Self {
            diff_mode: cli.diff_mode || config.defaults.diff,
            output,
            config,
        }
    }
}
