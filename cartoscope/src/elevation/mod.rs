//! Terrain elevation profiles for drawn lines.
//!
//! A drawn line is resolved into an ordered series of elevation samples,
//! one per vertex, by an [`ElevationService`]. The production
//! implementation queries the Google Elevation API; lookups degrade to an
//! empty profile instead of failing the draw pipeline.

mod google;
mod types;

pub use google::GoogleElevationService;
pub use types::{ElevationError, ElevationSample, ElevationService, SampleLocation};

#[cfg(test)]
pub use google::tests::{sample, MockElevationService};
