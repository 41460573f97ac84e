//! Live building footprints from OpenStreetMap.
//!
//! The "scan live buildings" action queries Overpass for building ways
//! around the current view center and converts them into extrusion-ready
//! GeoJSON polygons. Scans are best-effort: a failure produces an empty
//! collection, never an error for the caller.

mod osm;
mod service;

pub use osm::{buildings_to_features, FootprintError, DEFAULT_BUILDING_HEIGHT};
pub use service::{FootprintService, OverpassFootprints};

#[cfg(test)]
pub use service::tests::MockFootprints;
