//! The analysis computation itself.

use geo::Contains;
use geo_types::Polygon;
use geojson::{Feature, FeatureCollection};
use tracing::debug;

use crate::geometry::{
    geojson_centroid, point_from_geojson, polygon_area_sq_meters, round2, SQ_METERS_TO_ACRES,
    SQ_METERS_TO_HECTARES,
};

use super::{SectorAnalysis, MAX_LISTED_AMENITIES, MAX_LISTED_ZONES};

/// A polygon's area expressed in both reporting units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaBreakdown {
    /// Acres, rounded to two decimal places.
    pub acres: f64,
    /// Hectares, rounded to two decimal places.
    pub hectares: f64,
}

/// Computes a polygon's area in acres and hectares.
pub fn calculate_area(polygon: &Polygon<f64>) -> AreaBreakdown {
    let sq_meters = polygon_area_sq_meters(polygon);
    AreaBreakdown {
        acres: round2(sq_meters * SQ_METERS_TO_ACRES),
        hectares: round2(sq_meters * SQ_METERS_TO_HECTARES),
    }
}

/// Analyzes a drawn sector against the session's reference datasets.
///
/// # Arguments
///
/// * `region` - The drawn polygon, or `None` when nothing is drawn
/// * `zoning` - Zoning district features; polygons with a `zone_name` property
/// * `infrastructure` - Amenity features; only `Point` geometries participate
///
/// # Returns
///
/// The derived [`SectorAnalysis`]. This function never fails: a missing
/// region yields [`SectorAnalysis::zero`], and reference features that
/// cannot be interpreted are skipped individually.
///
/// A zoning district counts as intersected when its centroid falls inside
/// the drawn region. That is a deliberate approximation: true polygon
/// overlap is much more expensive on large district sets, and the centroid
/// test has proven close enough for sector reports. Duplicate district
/// names collapse to one entry before the list is capped.
pub fn analyze_selection(
    region: Option<&Polygon<f64>>,
    zoning: &FeatureCollection,
    infrastructure: &FeatureCollection,
) -> SectorAnalysis {
    let Some(region) = region else {
        return SectorAnalysis::zero();
    };

    let area = calculate_area(region);

    let mut intersected_zones: Vec<String> = Vec::new();
    for feature in &zoning.features {
        let Some(center) = feature.geometry.as_ref().and_then(geojson_centroid) else {
            continue;
        };
        if region.contains(&center) {
            let name = zone_name(feature);
            if !intersected_zones.contains(&name) {
                intersected_zones.push(name);
            }
        }
    }
    intersected_zones.truncate(MAX_LISTED_ZONES);

    let mut amenities: Vec<String> = Vec::new();
    for feature in &infrastructure.features {
        let Some(point) = feature.geometry.as_ref().and_then(point_from_geojson) else {
            continue;
        };
        if region.contains(&point) {
            amenities.push(amenity_name(feature));
        }
    }
    let amenity_count = amenities.len();
    amenities.truncate(MAX_LISTED_AMENITIES);

    debug!(
        acres = area.acres,
        zones = intersected_zones.len(),
        amenities = amenity_count,
        "sector analysis complete"
    );

    SectorAnalysis {
        area_acres: area.acres,
        area_hectares: area.hectares,
        intersected_zones,
        amenity_count,
        amenities,
    }
}

/// Reads a non-empty string property from a feature.
fn string_property(feature: &Feature, key: &str) -> Option<String> {
    feature
        .property(key)
        .and_then(|value| value.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn zone_name(feature: &Feature) -> String {
    string_property(feature, "zone_name").unwrap_or_else(|| "Unknown Zone".to_string())
}

fn amenity_name(feature: &Feature) -> String {
    string_property(feature, "name")
        .or_else(|| string_property(feature, "type"))
        .unwrap_or_else(|| "Unnamed Amenity".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{Coord, LineString};
    use geojson::JsonObject;
    use serde_json::json;

    /// Square with its southwest corner at the origin, `side_deg` degrees
    /// on each edge.
    fn square(side_deg: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: side_deg, y: 0.0 },
                Coord {
                    x: side_deg,
                    y: side_deg,
                },
                Coord { x: 0.0, y: side_deg },
                Coord { x: 0.0, y: 0.0 },
            ]),
            vec![],
        )
    }

    fn feature(geometry: Option<geojson::Geometry>, props: &[(&str, &str)]) -> Feature {
        let mut properties = JsonObject::new();
        for (key, value) in props {
            properties.insert((*key).to_string(), json!(value));
        }
        Feature {
            bbox: None,
            geometry,
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }

    fn point_feature(x: f64, y: f64, props: &[(&str, &str)]) -> Feature {
        feature(
            Some(geojson::Geometry::new(geojson::Value::Point(vec![x, y]))),
            props,
        )
    }

    /// Small zone polygon centered on (x, y).
    fn zone_feature(x: f64, y: f64, name: Option<&str>) -> Feature {
        let d = 0.0005;
        let geometry = geojson::Geometry::new(geojson::Value::Polygon(vec![vec![
            vec![x - d, y - d],
            vec![x + d, y - d],
            vec![x + d, y + d],
            vec![x - d, y + d],
            vec![x - d, y - d],
        ]]));
        match name {
            Some(name) => feature(Some(geometry), &[("zone_name", name)]),
            None => feature(Some(geometry), &[]),
        }
    }

    fn collection(features: Vec<Feature>) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    #[test]
    fn test_no_region_returns_zero_report() {
        let report = analyze_selection(None, &collection(vec![]), &collection(vec![]));
        assert_eq!(report, SectorAnalysis::zero());
    }

    #[test]
    fn test_polygon_with_empty_references() {
        let region = square(0.009);
        let report = analyze_selection(Some(&region), &collection(vec![]), &collection(vec![]));
        assert!(report.area_acres > 0.0);
        assert!(report.area_hectares > 0.0);
        assert!(report.intersected_zones.is_empty());
        assert_eq!(report.amenity_count, 0);
        assert!(report.amenities.is_empty());
    }

    #[test]
    fn test_area_within_one_percent_of_expected() {
        // 0.009 degrees of latitude is 0.009 * 111194.93 meters of side.
        let side_m = 0.009 * 111_194.93;
        let expected_acres = side_m * side_m * SQ_METERS_TO_ACRES;

        let region = square(0.009);
        let report = analyze_selection(Some(&region), &collection(vec![]), &collection(vec![]));
        let error = (report.area_acres - expected_acres).abs() / expected_acres;
        assert!(
            error < 0.01,
            "acres {} deviates {:.3}% from expected {}",
            report.area_acres,
            error * 100.0,
            expected_acres
        );
    }

    #[test]
    fn test_zone_with_centroid_inside_is_listed_once() {
        let region = square(0.01);
        let zoning = collection(vec![zone_feature(0.005, 0.005, Some("Commercial Core"))]);
        let report = analyze_selection(Some(&region), &zoning, &collection(vec![]));
        assert_eq!(report.intersected_zones, vec!["Commercial Core"]);
    }

    #[test]
    fn test_zone_with_centroid_outside_is_skipped() {
        let region = square(0.01);
        let zoning = collection(vec![zone_feature(0.5, 0.5, Some("Far Away"))]);
        let report = analyze_selection(Some(&region), &zoning, &collection(vec![]));
        assert!(report.intersected_zones.is_empty());
    }

    #[test]
    fn test_duplicate_zone_names_collapse() {
        let region = square(0.01);
        let zoning = collection(vec![
            zone_feature(0.002, 0.002, Some("Residential")),
            zone_feature(0.008, 0.008, Some("Residential")),
        ]);
        let report = analyze_selection(Some(&region), &zoning, &collection(vec![]));
        assert_eq!(report.intersected_zones, vec!["Residential"]);
    }

    #[test]
    fn test_zone_list_capped_at_five_first_found() {
        let region = square(0.01);
        let names = ["A", "B", "C", "D", "E", "F", "G"];
        let zoning = collection(
            names
                .into_iter()
                .enumerate()
                .map(|(i, name)| zone_feature(0.001 + i as f64 * 0.001, 0.005, Some(name)))
                .collect(),
        );
        let report = analyze_selection(Some(&region), &zoning, &collection(vec![]));
        assert_eq!(report.intersected_zones, vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn test_zone_without_name_reports_unknown() {
        let region = square(0.01);
        let zoning = collection(vec![zone_feature(0.005, 0.005, None)]);
        let report = analyze_selection(Some(&region), &zoning, &collection(vec![]));
        assert_eq!(report.intersected_zones, vec!["Unknown Zone"]);
    }

    #[test]
    fn test_seven_amenities_count_uncapped_list_capped() {
        let region = square(0.01);
        let names: Vec<String> = (0..7).map(|i| format!("Stop {i}")).collect();
        let infra = collection(
            names
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    point_feature(0.001 + i as f64 * 0.001, 0.005, &[("name", name.as_str())])
                })
                .collect(),
        );
        let report = analyze_selection(Some(&region), &collection(vec![]), &infra);
        assert_eq!(report.amenity_count, 7);
        assert_eq!(report.amenities.len(), 5);
        assert_eq!(report.amenities[0], "Stop 0");
        assert_eq!(report.amenities[4], "Stop 4");
    }

    #[test]
    fn test_amenity_outside_region_not_counted() {
        let region = square(0.01);
        let infra = collection(vec![point_feature(0.5, 0.5, &[("name", "Elsewhere")])]);
        let report = analyze_selection(Some(&region), &collection(vec![]), &infra);
        assert_eq!(report.amenity_count, 0);
    }

    #[test]
    fn test_amenity_name_fallback_chain() {
        let region = square(0.01);
        let infra = collection(vec![
            point_feature(0.001, 0.001, &[("name", "General Hospital")]),
            point_feature(0.002, 0.002, &[("type", "school")]),
            point_feature(0.003, 0.003, &[]),
            // Empty strings fall through like missing properties.
            point_feature(0.004, 0.004, &[("name", ""), ("type", "clinic")]),
        ]);
        let report = analyze_selection(Some(&region), &collection(vec![]), &infra);
        assert_eq!(
            report.amenities,
            vec!["General Hospital", "school", "Unnamed Amenity", "clinic"]
        );
    }

    #[test]
    fn test_non_point_infrastructure_skipped() {
        let region = square(0.01);
        let line = feature(
            Some(geojson::Geometry::new(geojson::Value::LineString(vec![
                vec![0.001, 0.001],
                vec![0.002, 0.002],
            ]))),
            &[("name", "A Road")],
        );
        let report = analyze_selection(Some(&region), &collection(vec![]), &collection(vec![line]));
        assert_eq!(report.amenity_count, 0);
    }

    #[test]
    fn test_features_without_geometry_skipped() {
        let region = square(0.01);
        let bare = feature(None, &[("zone_name", "Ghost"), ("name", "Ghost")]);
        let report = analyze_selection(
            Some(&region),
            &collection(vec![bare.clone()]),
            &collection(vec![bare]),
        );
        assert!(report.intersected_zones.is_empty());
        assert_eq!(report.amenity_count, 0);
    }

    #[test]
    fn test_calculate_area_units_agree() {
        let breakdown = calculate_area(&square(0.009));
        // Acres and hectares describe the same area.
        let ratio = breakdown.acres / breakdown.hectares;
        assert!((ratio - 2.47105).abs() < 0.01);
    }
}
