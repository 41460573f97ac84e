//! The sector analysis report type.

use serde::{Deserialize, Serialize};

/// Maximum number of zone names listed in a report.
pub const MAX_LISTED_ZONES: usize = 5;

/// Maximum number of amenity names listed in a report.
///
/// The amenity count is reported separately and is never capped.
pub const MAX_LISTED_AMENITIES: usize = 5;

/// Derived metrics for one drawn sector.
///
/// A report is immutable once computed: redrawing the sector produces a new
/// report that supersedes this one wholesale rather than merging into it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SectorAnalysis {
    /// Sector area in acres, rounded to two decimal places.
    pub area_acres: f64,
    /// Sector area in hectares, rounded to two decimal places.
    pub area_hectares: f64,
    /// Names of zoning districts whose centroid falls inside the sector,
    /// deduplicated, first-found order, at most [`MAX_LISTED_ZONES`].
    pub intersected_zones: Vec<String>,
    /// Total number of amenities inside the sector, uncapped.
    pub amenity_count: usize,
    /// Display names of amenities inside the sector, first-found order,
    /// at most [`MAX_LISTED_AMENITIES`].
    pub amenities: Vec<String>,
}

impl SectorAnalysis {
    /// The zero-value report: no area, no zones, no amenities.
    ///
    /// Returned when there is no drawn region to analyze.
    pub fn zero() -> Self {
        Self::default()
    }
}
