//! Elevation profile types and the service trait.

use std::future::Future;

use geo_types::LineString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while querying the elevation API.
///
/// These stay inside the service: a failed lookup degrades to an empty
/// profile rather than reaching the draw pipeline.
#[derive(Debug, Error)]
pub enum ElevationError {
    /// Transport-level failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected shape.
    #[error("invalid response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The API answered with a non-OK status field.
    #[error("elevation API returned status '{0}'")]
    Status(String),
}

/// Where one elevation sample was taken.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleLocation {
    pub lat: f64,
    pub lng: f64,
}

/// One point of an elevation profile.
///
/// `distance` is the sample's ordinal position along the drawn line, which
/// is what the profile chart plots on its x axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationSample {
    pub distance: f64,
    pub elevation: f64,
    pub location: SampleLocation,
}

/// Samples terrain elevation along a drawn line.
///
/// Implementations never fail the caller: any error degrades to an empty
/// profile with a logged warning.
pub trait ElevationService: Send + Sync {
    /// Produces one sample per vertex of the line, in order.
    fn profile(&self, line: &LineString<f64>) -> impl Future<Output = Vec<ElevationSample>> + Send;
}
