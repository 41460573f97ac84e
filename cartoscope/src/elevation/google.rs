//! Google Elevation API client.

use geo_types::LineString;
use serde::Deserialize;
use tracing::{debug, warn};

use super::types::{ElevationError, ElevationSample, ElevationService, SampleLocation};

const ELEVATION_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/elevation/json";

/// Elevation lookups backed by the Google Elevation API.
///
/// Built without an API key the service still satisfies the trait: every
/// profile request logs a warning and returns no samples, so line draws
/// keep working with an empty chart.
#[derive(Debug, Clone)]
pub struct GoogleElevationService {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl GoogleElevationService {
    /// Creates a service that shares the given HTTP client.
    ///
    /// # Arguments
    ///
    /// * `client` - Pre-configured HTTP client (timeouts live there)
    /// * `api_key` - Google API key, or `None` to run degraded
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            endpoint: ELEVATION_ENDPOINT.to_string(),
        }
    }

    /// Overrides the API endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn request(&self, url: &str) -> Result<Vec<ElevationSample>, ElevationError> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_profile(&body)
    }
}

impl ElevationService for GoogleElevationService {
    async fn profile(&self, line: &LineString<f64>) -> Vec<ElevationSample> {
        let Some(api_key) = &self.api_key else {
            warn!("Google API key not configured, returning empty elevation profile");
            return Vec::new();
        };

        let locations = locations_parameter(line);
        if locations.is_empty() {
            return Vec::new();
        }

        let url = format!("{}?locations={}&key={}", self.endpoint, locations, api_key);
        match self.request(&url).await {
            Ok(samples) => {
                debug!(samples = samples.len(), "elevation profile fetched");
                samples
            }
            Err(err) => {
                warn!(error = %err, "elevation lookup failed, returning empty profile");
                Vec::new()
            }
        }
    }
}

/// Encodes line vertices as the API's `locations` parameter.
///
/// Each vertex becomes `lat,lng` and vertices are joined with `|`.
fn locations_parameter(line: &LineString<f64>) -> String {
    let pairs: Vec<String> = line
        .coords()
        .map(|coord| format!("{},{}", coord.y, coord.x))
        .collect();
    pairs.join("|")
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    status: String,
    #[serde(default)]
    results: Vec<ProfileResult>,
}

#[derive(Debug, Deserialize)]
struct ProfileResult {
    elevation: f64,
    location: SampleLocation,
}

/// Parses an elevation response body into ordered samples.
fn parse_profile(body: &str) -> Result<Vec<ElevationSample>, ElevationError> {
    let response: ProfileResponse = serde_json::from_str(body)?;
    if response.status != "OK" {
        return Err(ElevationError::Status(response.status));
    }

    Ok(response
        .results
        .into_iter()
        .enumerate()
        .map(|(index, result)| ElevationSample {
            distance: index as f64,
            elevation: result.elevation,
            location: result.location,
        })
        .collect())
}
