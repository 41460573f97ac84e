//! Dataset retrieval abstraction.
//!
//! Loaders speak to a [`DatasetFetcher`] rather than to the network
//! directly, so tests and CLI tooling can substitute canned or filesystem
//! fetchers for the HTTP one.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::trace;

/// Errors raised while retrieving or decoding a reference dataset.
///
/// These never escape the loader: every variant collapses into an empty
/// feature collection plus a failure-cache entry.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Transport-level failure: HTTP error status, connection refused,
    /// missing file.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The body was not a valid GeoJSON feature collection.
    #[error("invalid GeoJSON: {0}")]
    Parse(#[from] geojson::Error),
}

/// Retrieves the raw text of a named reference dataset.
pub trait DatasetFetcher: Send + Sync {
    /// Fetches one dataset by filename (e.g. `"zoning.json"`).
    ///
    /// # Returns
    ///
    /// The dataset body as text, or a [`DatasetError`] describing why it
    /// could not be retrieved.
    fn fetch(&self, name: &str) -> impl Future<Output = Result<String, DatasetError>> + Send;
}

/// Fetches datasets over HTTP from a base URL.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    /// Creates a fetcher rooted at `base_url` (no trailing slash needed).
    pub fn new(base_url: impl Into<String>) -> Result<Self, DatasetError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DatasetError::Fetch(format!("failed to create HTTP client: {e}")))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Creates a fetcher that reuses an existing HTTP client.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl DatasetFetcher for HttpFetcher {
    async fn fetch(&self, name: &str) -> Result<String, DatasetError> {
        let url = format!("{}/{}", self.base_url, name);
        trace!(url = %url, "dataset fetch starting");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DatasetError::Fetch(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(DatasetError::Fetch(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response
            .text()
            .await
            .map_err(|e| DatasetError::Fetch(format!("failed to read response: {e}")))
    }
}

/// Fetches datasets from a local directory.
///
/// Used by the CLI, which analyzes files on disk instead of a hosted
/// `/data/` endpoint.
#[derive(Clone)]
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    /// Creates a fetcher rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DatasetFetcher for DirFetcher {
    async fn fetch(&self, name: &str) -> Result<String, DatasetError> {
        let path = self.root.join(name);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| DatasetError::Fetch(format!("failed to read {}: {e}", path.display())))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Canned-response fetcher for tests.
    #[derive(Default)]
    pub struct MockFetcher {
        responses: HashMap<String, Result<String, String>>,
        calls: AtomicUsize,
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Registers a successful response body for a dataset name.
        pub fn with_body(mut self, name: &str, body: &str) -> Self {
            self.responses
                .insert(name.to_string(), Ok(body.to_string()));
            self
        }

        /// Registers a failure for a dataset name.
        pub fn with_failure(mut self, name: &str, message: &str) -> Self {
            self.responses
                .insert(name.to_string(), Err(message.to_string()));
            self
        }

        /// How many fetches have been attempted, cache misses only.
        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DatasetFetcher for MockFetcher {
        async fn fetch(&self, name: &str) -> Result<String, DatasetError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.responses.get(name) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(message)) => Err(DatasetError::Fetch(message.clone())),
                None => Err(DatasetError::Fetch(format!(
                    "no response configured for '{name}'"
                ))),
            }
        }
    }

    #[tokio::test]
    async fn test_mock_fetcher_round_trip() {
        let fetcher = MockFetcher::new()
            .with_body("zoning.json", "{}")
            .with_failure("missing.json", "HTTP 404");

        assert_eq!(fetcher.fetch("zoning.json").await.unwrap(), "{}");
        assert!(fetcher.fetch("missing.json").await.is_err());
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test]
    async fn test_dir_fetcher_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("zoning.json"),
            r#"{"type":"FeatureCollection","features":[]}"#,
        )
        .unwrap();

        let fetcher = DirFetcher::new(dir.path());
        let body = fetcher.fetch("zoning.json").await.unwrap();
        assert!(body.contains("FeatureCollection"));

        let missing = fetcher.fetch("absent.json").await;
        assert!(matches!(missing, Err(DatasetError::Fetch(_))));
    }
}
