//! Cartoscope CLI - command-line interface.
//!
//! This binary provides a command-line interface to the Cartoscope library:
//! offline region analysis, catalog derivation, mount planning, and
//! descriptor validation.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use tracing::info;

use cartoscope::logging::{default_log_dir, default_log_file, init_logging};
use commands::{analyze, catalog, plan, validate};
use error::CliError;

#[derive(Parser)]
#[command(name = "cartoscope")]
#[command(about = "Inspect and exercise the cartoscope map core", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a drawn region against local GeoJSON datasets
    Analyze(analyze::AnalyzeArgs),
    /// Derive the layer catalog for a described session state
    Catalog(catalog::CatalogArgs),
    /// Preview the mutations a catalog mount would issue
    Plan(plan::PlanArgs),
    /// Validate a descriptor set file
    Validate(validate::ValidateArgs),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Analyze(_) => "analyze",
            Command::Catalog(_) => "catalog",
            Command::Plan(_) => "plan",
            Command::Validate(_) => "validate",
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Keep the guard alive for the whole run so buffered log lines flush.
    let _guard = match init_logging(default_log_dir(), default_log_file()) {
        Ok(guard) => guard,
        Err(err) => CliError::LoggingInit(err.to_string()).exit(),
    };

    info!("Cartoscope v{}", cartoscope::VERSION);
    info!("Cartoscope CLI: {} command", cli.command.name());

    let result = match cli.command {
        Command::Analyze(args) => analyze::run(args).await,
        Command::Catalog(args) => catalog::run(args),
        Command::Plan(args) => plan::run(args),
        Command::Validate(args) => validate::run(args),
    };

    if let Err(err) = result {
        err.exit();
    }
}
