//! Session configuration.

use crate::catalog::CatalogConfig;
use crate::renderer::EngineKind;

/// Settings for a [`MapSession`](super::MapSession).
///
/// # Example
///
/// ```ignore
/// let config = SessionConfig::new()
///     .with_access_token("pk.live-token")
///     .with_engine(EngineKind::MapLibre)
///     .with_catalog(CatalogConfig::new().with_data_base_url("https://cdn.example.net/data"));
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    access_token: Option<String>,
    engine: EngineKind,
    elevation_api_key: Option<String>,
    catalog: CatalogConfig,
}

impl SessionConfig {
    /// Creates the default configuration: Mapbox engine, no credentials,
    /// datasets under `/data`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tile-provider access token.
    ///
    /// Without one, every hosted tileset source fails to mount and the
    /// session reports a failed system health.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Selects the rendering engine the session starts on.
    pub fn with_engine(mut self, engine: EngineKind) -> Self {
        self.engine = engine;
        self
    }

    /// Sets the elevation provider API key.
    ///
    /// Without one, elevation profile lookups return empty results.
    pub fn with_elevation_api_key(mut self, key: impl Into<String>) -> Self {
        self.elevation_api_key = Some(key.into());
        self
    }

    /// Overrides catalog settings, including the dataset base URL.
    pub fn with_catalog(mut self, catalog: CatalogConfig) -> Self {
        self.catalog = catalog;
        self
    }

    /// The configured access token, if any.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// The engine the session starts on.
    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    /// The configured elevation API key, if any.
    pub fn elevation_api_key(&self) -> Option<&str> {
        self.elevation_api_key.as_deref()
    }

    /// Catalog settings.
    pub fn catalog(&self) -> &CatalogConfig {
        &self.catalog
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            engine: EngineKind::Mapbox,
            elevation_api_key: None,
            catalog: CatalogConfig::default(),
        }
    }
}
