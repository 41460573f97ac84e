//! Geometry helpers shared by the analysis and draw modules.
//!
//! Everything here works on WGS84 longitude/latitude coordinates. Areas are
//! computed with the Chamberlain–Duquette spherical excess algorithm, which
//! matches what mainstream web-mapping toolkits report for drawn polygons.

use geo::{Centroid, ChamberlainDuquetteArea, Contains};
use geo_types::{Geometry, LineString, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};

/// Square meters per acre conversion factor.
pub const SQ_METERS_TO_ACRES: f64 = 0.000_247_105;

/// Square meters per hectare conversion factor.
pub const SQ_METERS_TO_HECTARES: f64 = 0.0001;

/// A geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLatBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl LngLatBounds {
    /// Creates a bounding box from its four edges.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Creates a square box centered on a point, extending `delta_deg`
    /// degrees in every direction.
    pub fn around(center: Point<f64>, delta_deg: f64) -> Self {
        Self {
            west: center.x() - delta_deg,
            south: center.y() - delta_deg,
            east: center.x() + delta_deg,
            north: center.y() + delta_deg,
        }
    }

    /// Returns true if the point lies inside or on the box.
    pub fn contains(&self, point: Point<f64>) -> bool {
        point.x() >= self.west
            && point.x() <= self.east
            && point.y() >= self.south
            && point.y() <= self.north
    }
}

/// Unsigned area of a polygon in square meters.
pub fn polygon_area_sq_meters(polygon: &Polygon<f64>) -> f64 {
    polygon.chamberlain_duquette_unsigned_area()
}

/// Area-weighted centroid of a polygon.
///
/// Returns `None` only for degenerate polygons with no area and no
/// vertices, which drawn regions never produce in practice.
pub fn polygon_centroid(polygon: &Polygon<f64>) -> Option<Point<f64>> {
    polygon.centroid()
}

/// Rounds a value to two decimal places, matching reported-figure precision
/// for acreage and hectares.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Converts a GeoJSON geometry into a polygon, if it is one.
pub fn polygon_from_geojson(geometry: &geojson::Geometry) -> Option<Polygon<f64>> {
    match geometry.value {
        geojson::Value::Polygon(_) => Polygon::try_from(geometry).ok(),
        _ => None,
    }
}

/// Converts a GeoJSON geometry into a line string, if it is one.
pub fn line_from_geojson(geometry: &geojson::Geometry) -> Option<LineString<f64>> {
    match geometry.value {
        geojson::Value::LineString(_) => LineString::try_from(geometry).ok(),
        _ => None,
    }
}

/// Point-in-geometry test for GeoJSON polygons and multipolygons.
///
/// Geometries of any other type, and geometries that fail conversion,
/// simply do not contain the point.
pub fn geojson_contains_point(geometry: &geojson::Geometry, point: Point<f64>) -> bool {
    match geometry.value {
        geojson::Value::Polygon(_) => Polygon::try_from(geometry)
            .map(|p| p.contains(&point))
            .unwrap_or(false),
        geojson::Value::MultiPolygon(_) => MultiPolygon::try_from(geometry)
            .map(|mp| mp.contains(&point))
            .unwrap_or(false),
        _ => false,
    }
}

/// Extracts the point coordinate from a GeoJSON point geometry.
pub fn point_from_geojson(geometry: &geojson::Geometry) -> Option<Point<f64>> {
    match geometry.value {
        geojson::Value::Point(_) => Point::try_from(geometry).ok(),
        _ => None,
    }
}

/// Centroid of any GeoJSON geometry, or `None` when the geometry cannot be
/// converted or has no defined centroid.
pub fn geojson_centroid(geometry: &geojson::Geometry) -> Option<Point<f64>> {
    Geometry::<f64>::try_from(geometry).ok()?.centroid()
}
