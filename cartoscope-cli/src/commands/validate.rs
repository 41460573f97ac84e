//! Validate command - check a descriptor set file.

use clap::Args;

use cartoscope::descriptor::DescriptorSet;

use crate::error::CliError;

/// Arguments for the validate command.
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Path to a descriptor set JSON file
    #[arg(long)]
    pub file: String,
}

/// Run the validate command.
pub fn run(args: ValidateArgs) -> Result<(), CliError> {
    let body = std::fs::read_to_string(&args.file).map_err(|error| CliError::FileRead {
        path: args.file.clone(),
        error,
    })?;
    let set: DescriptorSet =
        serde_json::from_str(&body).map_err(|e| CliError::InvalidDescriptors(e.to_string()))?;
    set.validate()
        .map_err(|e| CliError::InvalidDescriptors(e.to_string()))?;

    println!(
        "{}: OK ({} sources, {} layers)",
        args.file,
        set.sources().len(),
        set.layers().len()
    );
    println!("Paint order:");
    for layer in set.layers_in_paint_order() {
        println!("  {} ({})", layer.id, layer.kind);
    }
    Ok(())
}
