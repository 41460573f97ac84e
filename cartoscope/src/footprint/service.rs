//! Live building scans against the Overpass API.

use std::future::Future;

use geojson::FeatureCollection;
use tracing::{debug, warn};

use super::osm::{buildings_to_features, FootprintError};
use crate::geometry::LngLatBounds;

const OVERPASS_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Discovers building footprints inside a bounding box.
///
/// A scan never fails the caller: any error degrades to an empty
/// collection with a logged warning.
pub trait FootprintService: Send + Sync {
    /// Returns extrusion-ready polygon features for buildings in `bounds`.
    fn scan(&self, bounds: &LngLatBounds) -> impl Future<Output = FeatureCollection> + Send;
}

/// Building scans backed by the public Overpass API.
#[derive(Debug, Clone)]
pub struct OverpassFootprints {
    client: reqwest::Client,
    endpoint: String,
}

impl OverpassFootprints {
    /// Creates a service that shares the given HTTP client.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: OVERPASS_ENDPOINT.to_string(),
        }
    }

    /// Overrides the API endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn request(&self, query: &str) -> Result<FeatureCollection, FootprintError> {
        let body = self
            .client
            .get(&self.endpoint)
            .query(&[("data", query)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        buildings_to_features(&body)
    }
}

impl FootprintService for OverpassFootprints {
    async fn scan(&self, bounds: &LngLatBounds) -> FeatureCollection {
        let query = building_query(bounds);
        match self.request(&query).await {
            Ok(collection) => {
                debug!(
                    features = collection.features.len(),
                    "building scan complete"
                );
                collection
            }
            Err(err) => {
                warn!(error = %err, "building scan failed, returning no footprints");
                FeatureCollection {
                    bbox: None,
                    features: Vec::new(),
                    foreign_members: None,
                }
            }
        }
    }
}

/// Overpass QL for building ways and relations in a box.
///
/// Overpass wants bounds as `(south,west,north,east)`. The trailing
/// recursion pulls in the member nodes the ways reference.
fn building_query(bounds: &LngLatBounds) -> String {
    format!(
        "[out:json][timeout:25];\
         (way[\"building\"]({s},{w},{n},{e});\
         relation[\"building\"]({s},{w},{n},{e}););\
         out body;>;out skel qt;",
        s = bounds.south,
        w = bounds.west,
        n = bounds.north,
        e = bounds.east,
    )
}
