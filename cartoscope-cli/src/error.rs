//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Failed to read an input file
    FileRead { path: String, error: std::io::Error },
    /// Failed to write an output file
    FileWrite { path: String, error: std::io::Error },
    /// The region input was not a usable GeoJSON geometry
    InvalidRegion(String),
    /// A descriptor set failed to parse or validate
    InvalidDescriptors(String),
    /// JSON serialization failed
    Json(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::InvalidRegion(_) => {
                eprintln!();
                eprintln!("The region file must contain GeoJSON: a Polygon geometry, or a");
                eprintln!("Feature (or FeatureCollection) whose geometry is a Polygon.");
            }
            CliError::InvalidDescriptors(_) => {
                eprintln!();
                eprintln!("A descriptor set must give every source and layer a unique id,");
                eprintln!("and every layer must reference a source defined in the set.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read file '{}': {}", path, error)
            }
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path, error)
            }
            CliError::InvalidRegion(msg) => write!(f, "Invalid region: {}", msg),
            CliError::InvalidDescriptors(msg) => write!(f, "Invalid descriptor set: {}", msg),
            CliError::Json(msg) => write!(f, "JSON serialization failed: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::FileRead { error, .. } => Some(error),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}
