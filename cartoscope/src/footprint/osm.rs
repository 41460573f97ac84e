//! Conversion of Overpass OSM JSON into GeoJSON building footprints.

use std::collections::{BTreeMap, HashMap};

use geojson::{feature::Id, Feature, FeatureCollection, Geometry, JsonObject};
use serde::Deserialize;
use thiserror::Error;
use tracing::trace;

/// Extrusion height assigned when a building carries no usable height tag.
pub const DEFAULT_BUILDING_HEIGHT: f64 = 15.0;

/// Errors raised while scanning building footprints.
///
/// Like elevation lookups these never reach the caller of a scan: a failed
/// scan degrades to an empty collection.
#[derive(Debug, Error)]
pub enum FootprintError {
    /// Transport-level failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not Overpass JSON.
    #[error("invalid response: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct OsmResponse {
    #[serde(default)]
    elements: Vec<OsmElement>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum OsmElement {
    Node {
        id: i64,
        lat: f64,
        lon: f64,
    },
    Way {
        id: i64,
        #[serde(default)]
        nodes: Vec<i64>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    Relation {
        id: i64,
    },
}

/// Converts an Overpass building response into polygon features.
///
/// Tagged closed ways become polygons with their tags as properties plus a
/// numeric `height` suitable for extrusion. Untagged ways are relation
/// skeletons and are dropped, as are relations themselves: multipolygon
/// assembly is not worth the complexity for a viewport-sized scan.
pub fn buildings_to_features(body: &str) -> Result<FeatureCollection, FootprintError> {
    let response: OsmResponse = serde_json::from_str(body)?;

    let mut nodes: HashMap<i64, (f64, f64)> = HashMap::new();
    for element in &response.elements {
        if let OsmElement::Node { id, lat, lon } = element {
            nodes.insert(*id, (*lon, *lat));
        }
    }

    let mut features = Vec::new();
    for element in &response.elements {
        match element {
            OsmElement::Node { .. } => {}
            OsmElement::Relation { id } => {
                trace!(relation = id, "skipping building relation");
            }
            OsmElement::Way { id, nodes: refs, tags } => {
                if tags.is_empty() {
                    // Relation member skeleton, no feature of its own.
                    continue;
                }
                match way_to_polygon(refs, &nodes) {
                    Some(ring) => features.push(building_feature(*id, ring, tags)),
                    None => trace!(way = id, "skipping non-ring building way"),
                }
            }
        }
    }

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// Resolves a way's node refs into a closed ring, or `None` when any node
/// is missing or the way does not close on itself.
fn way_to_polygon(refs: &[i64], nodes: &HashMap<i64, (f64, f64)>) -> Option<Vec<Vec<f64>>> {
    let ring: Option<Vec<Vec<f64>>> = refs
        .iter()
        .map(|id| nodes.get(id).map(|&(lon, lat)| vec![lon, lat]))
        .collect();
    let ring = ring?;

    if ring.len() < 4 || ring.first() != ring.last() {
        return None;
    }
    Some(ring)
}

fn building_feature(id: i64, ring: Vec<Vec<f64>>, tags: &BTreeMap<String, String>) -> Feature {
    let mut properties = JsonObject::new();
    for (key, value) in tags {
        properties.insert(key.clone(), serde_json::Value::String(value.clone()));
    }

    // Height tag first, then three meters per tagged level. Zero or
    // negative values would extrude invisibly, so they fall through too.
    let height = tags
        .get("height")
        .and_then(|raw| leading_number(raw))
        .filter(|height| *height > 0.0)
        .or_else(|| {
            tags.get("building:levels")
                .and_then(|raw| leading_number(raw))
                .filter(|levels| *levels > 0.0)
                .map(|levels| levels * 3.0)
        })
        .unwrap_or(DEFAULT_BUILDING_HEIGHT);
    properties.insert("height".to_string(), serde_json::json!(height));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::Polygon(vec![ring]))),
        id: Some(Id::String(format!("way/{id}"))),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Parses the leading decimal number of a tag value, so `"12 m"` yields 12.
fn leading_number(value: &str) -> Option<f64> {
    let trimmed = value.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    for (index, c) in trimmed.char_indices() {
        match c {
            '0'..='9' => end = index + 1,
            '.' if !seen_dot => {
                seen_dot = true;
                end = index + 1;
            }
            '-' | '+' if index == 0 => end = index + 1,
            _ => break,
        }
    }
    trimmed[..end].trim_end_matches('.').parse().ok()
}
