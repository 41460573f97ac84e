//! Catalog command - print the derived layer catalog.

use clap::Args;

use cartoscope::catalog::{derive_descriptors, CatalogConfig};

use super::common::StateFlags;
use crate::error::CliError;

/// Arguments for the catalog command.
#[derive(Debug, Args)]
pub struct CatalogArgs {
    /// Base URL reference datasets are served from
    #[arg(long, default_value = "/data")]
    pub data_url: String,

    /// Write the catalog JSON to a file instead of stdout
    #[arg(long)]
    pub output: Option<String>,

    #[command(flatten)]
    pub state: StateFlags,
}

/// Run the catalog command.
pub fn run(args: CatalogArgs) -> Result<(), CliError> {
    let snapshot = args.state.snapshot();
    let config = CatalogConfig::new().with_data_base_url(args.data_url.clone());
    let set = derive_descriptors(&snapshot, None, &config);

    let json = serde_json::to_string_pretty(&set).map_err(|e| CliError::Json(e.to_string()))?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json).map_err(|error| CliError::FileWrite {
                path: path.clone(),
                error,
            })?;
            println!(
                "Catalog written to {} ({} sources, {} layers)",
                path,
                set.sources().len(),
                set.layers().len()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}
