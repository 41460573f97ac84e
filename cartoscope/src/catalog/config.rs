//! Catalog configuration.

/// Where the catalog points its reference-dataset sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    data_base_url: String,
}

impl CatalogConfig {
    /// Creates a config serving datasets from the default `/data` path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the base URL datasets are served from. Absolute URLs and
    /// site-relative paths both work.
    pub fn with_data_base_url(mut self, base: impl Into<String>) -> Self {
        self.data_base_url = base.into();
        self
    }

    /// The base URL datasets are served from.
    pub fn data_base_url(&self) -> &str {
        &self.data_base_url
    }

    /// The URL a named dataset is fetched from.
    pub fn dataset_url(&self, name: &str) -> String {
        format!("{}/{}", self.data_base_url.trim_end_matches('/'), name)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_base_url: "/data".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_path() {
        let config = CatalogConfig::new();
        assert_eq!(config.dataset_url("zoning.json"), "/data/zoning.json");
    }

    #[test]
    fn test_custom_base_trims_trailing_slash() {
        let config = CatalogConfig::new().with_data_base_url("https://cdn.example.net/static/");
        assert_eq!(
            config.dataset_url("metro-stations.json"),
            "https://cdn.example.net/static/metro-stations.json"
        );
    }
}
