//! The single drawn region a session can hold.

use geo_types::{LineString, Polygon};

use crate::geometry::{line_from_geojson, polygon_from_geojson};

/// The shape the user most recently finished drawing.
///
/// At most one region exists at a time; a new draw replaces it and a
/// delete destroys it. Polygons feed sector analysis, lines feed the
/// elevation profile.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawnRegion {
    Polygon(Polygon<f64>),
    Line(LineString<f64>),
}

impl DrawnRegion {
    /// Interprets a drawn GeoJSON geometry as a region.
    ///
    /// Returns `None` for points and any other geometry type the analysis
    /// pipeline has no use for.
    pub fn from_geometry(geometry: &geojson::Geometry) -> Option<Self> {
        if let Some(polygon) = polygon_from_geojson(geometry) {
            return Some(Self::Polygon(polygon));
        }
        line_from_geojson(geometry).map(Self::Line)
    }

    pub fn as_polygon(&self) -> Option<&Polygon<f64>> {
        match self {
            Self::Polygon(polygon) => Some(polygon),
            Self::Line(_) => None,
        }
    }

    pub fn as_line(&self) -> Option<&LineString<f64>> {
        match self {
            Self::Line(line) => Some(line),
            Self::Polygon(_) => None,
        }
    }
}
