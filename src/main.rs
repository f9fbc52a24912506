//! awplus-reconcile - compute AlliedWare Plus configuration commands
//!
//! This is the main entry point for the awplus-reconcile CLI.

mod cli;

use anyhow::Result;
use awplus_resources::config::Config;
use cli::commands::CommandContext;
use cli::output::OutputFormatter;
use cli::{Cli, Commands};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    // Parse command line arguments
    let cli = Cli::parse_args();

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            let output = OutputFormatter::new(
                !cli.no_color,
                cli.output.unwrap_or_default(),
                cli.verbosity(),
            );
            output.error(&format!("{:#}", err));
            err.downcast_ref::<awplus_resources::Error>()
                .map_or(1, |e| e.exit_code())
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> Result<i32> {
    // Load configuration
    let config = Config::load(cli.config_file.as_ref())?;

    // Initialize logging based on verbosity
    init_logging(cli.verbosity(), &config);

    if cli.verbosity() >= 2 {
        eprintln!("awplus-reconcile v{}", awplus_resources::version());
    }

    let mut ctx = CommandContext::new(cli, config);

    match &cli.command {
        Commands::Reconcile(args) => args.execute(&mut ctx),
        Commands::List(args) => args.execute(&mut ctx),
    }
}

/// Initialize logging based on verbosity level and the logging config
fn init_logging(verbosity: u8, config: &Config) {
    let filter = match verbosity {
        0 => config.logging.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.logging.is_json() {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(verbosity >= 3)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
