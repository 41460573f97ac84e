//! Reference dataset loading.
//!
//! Reference data (zoning polygons, infrastructure points, master-plan
//! overlays) is loaded once per session per dataset and held immutable from
//! then on. Loading never fails the caller: a missing or malformed dataset
//! degrades to an empty collection, and the failure is recorded write-once
//! so the same filename is never refetched.

mod fetcher;
mod loader;

pub use fetcher::{DatasetError, DatasetFetcher, DirFetcher, HttpFetcher};
pub use loader::{DatasetLoader, FailureCache};

#[cfg(test)]
pub use fetcher::tests::MockFetcher;

/// Filenames of the stock reference datasets.
pub mod datasets {
    /// Zoning polygons, the primary analysis reference.
    pub const ZONING: &str = "zoning.json";
    /// Infrastructure and amenity points.
    pub const INFRASTRUCTURE: &str = "infrastructure.json";
    /// Master-plan metro station points.
    pub const METRO_STATIONS: &str = "metro-stations.json";
    /// Master-plan light-rail corridor alignment.
    pub const LRTS_ALIGNMENT: &str = "lrts-alignment.json";
    /// Master-plan land-use zone polygons.
    pub const LAND_USE_ZONES: &str = "land-use-zones.json";
}
