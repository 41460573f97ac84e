//! Cartoscope - interactive geospatial map core
//!
//! This library provides the state, reconciliation, and analysis engines
//! behind an interactive city map: a declarative layer catalog diffed onto
//! pluggable rendering engines, region analysis against reference datasets,
//! and draw-gesture routing to analysis and elevation services.
//!
//! # High-Level API
//!
//! For most use cases, the [`session`] module provides the assembled stack:
//!
//! ```ignore
//! use cartoscope::session::{MapSession, SessionConfig};
//! use cartoscope::store::PresentDayLayer;
//!
//! let session = MapSession::start_default(
//!     SessionConfig::new().with_access_token("pk.live-token"),
//! )?;
//!
//! // Layer toggles flow through the catalog to the renderer.
//! session.store().toggle_present_day(PresentDayLayer::Healthcare);
//! ```
//!
//! The engines underneath are usable on their own: [`reconcile`] for
//! descriptor diffing, [`analysis`] for region reports, [`draw`] for the
//! gesture state machine, and [`catalog`] for deriving descriptors from
//! store state.

pub mod analysis;
pub mod catalog;
pub mod dataset;
pub mod descriptor;
pub mod draw;
pub mod elevation;
pub mod footprint;
pub mod geometry;
pub mod logging;
pub mod reconcile;
pub mod renderer;
pub mod session;
pub mod store;

/// Version of the cartoscope library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_geometry_module_exists() {
        use crate::geometry::LngLatBounds;
        let bounds = LngLatBounds::new(76.9, 8.5, 77.0, 8.6);
        assert!(bounds.contains(geo::Point::new(76.95, 8.55)));
    }
}
