//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`analyze`] - Analyze a drawn region against local GeoJSON datasets
//! - [`catalog`] - Derive the layer catalog for a described session state
//! - [`plan`] - Preview the mutations a catalog mount would issue
//! - [`validate`] - Structural validation of a descriptor set file

pub mod analyze;
pub mod catalog;
pub mod common;
pub mod plan;
pub mod validate;
