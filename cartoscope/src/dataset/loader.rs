//! Never-fails reference dataset loading.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use geojson::FeatureCollection;
use tracing::{debug, trace, warn};

use super::{DatasetError, DatasetFetcher};

static GLOBAL_FAILURES: OnceLock<FailureCache> = OnceLock::new();

/// Write-once record of datasets that failed to load.
///
/// A dataset that failed once is never refetched: the first failure message
/// wins and every later [`DatasetLoader::load`] for that name short-circuits
/// to an empty collection. Clones share the same entries. The
/// [`global`](Self::global) instance is shared by every loader that does not
/// inject its own, so independent loaders in one process agree on what has
/// already failed.
#[derive(Clone, Default)]
pub struct FailureCache {
    entries: Arc<DashMap<String, String>>,
}

impl FailureCache {
    /// Creates an empty, isolated cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide cache.
    pub fn global() -> Self {
        GLOBAL_FAILURES.get_or_init(Self::new).clone()
    }

    /// Records a failure unless one is already recorded for this name.
    pub fn record(&self, name: &str, message: impl Into<String>) {
        self.entries
            .entry(name.to_string())
            .or_insert_with(|| message.into());
    }

    /// The recorded failure message for a dataset, if any.
    pub fn get(&self, name: &str) -> Option<String> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    /// Whether a failure is recorded for this name.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of recorded failures.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has failed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loads reference feature collections, degrading instead of failing.
///
/// Every dataset is fetched at most once per loader: successes are cached as
/// shared collections, failures go to the [`FailureCache`] and are served as
/// empty collections from then on. `load` has no error path; the analysis
/// engine runs against whatever reference data exists.
pub struct DatasetLoader<F> {
    fetcher: Arc<F>,
    loaded: Arc<DashMap<String, Arc<FeatureCollection>>>,
    failures: FailureCache,
}

// Not derived: clones share the fetcher, so `F` itself need not be `Clone`.
impl<F> Clone for DatasetLoader<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            loaded: Arc::clone(&self.loaded),
            failures: self.failures.clone(),
        }
    }
}

impl<F: DatasetFetcher> DatasetLoader<F> {
    /// Creates a loader using the process-wide failure cache.
    pub fn new(fetcher: F) -> Self {
        Self::with_failure_cache(fetcher, FailureCache::global())
    }

    /// Creates a loader with an explicit failure cache.
    pub fn with_failure_cache(fetcher: F, failures: FailureCache) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            loaded: Arc::new(DashMap::new()),
            failures,
        }
    }

    /// Read access to the underlying fetcher.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// The failure cache this loader records into.
    pub fn failures(&self) -> &FailureCache {
        &self.failures
    }

    /// Loads a dataset by filename.
    ///
    /// # Returns
    ///
    /// The parsed feature collection, or an empty one if the dataset is
    /// unavailable or malformed. Never an error.
    pub async fn load(&self, name: &str) -> Arc<FeatureCollection> {
        if let Some(collection) = self.loaded.get(name) {
            trace!(dataset = name, "dataset cache hit");
            return Arc::clone(collection.value());
        }
        if let Some(message) = self.failures.get(name) {
            trace!(dataset = name, message = %message, "dataset failure cached, not retrying");
            return Arc::new(empty_collection());
        }

        match self.fetch_and_parse(name).await {
            Ok(collection) => {
                debug!(
                    dataset = name,
                    features = collection.features.len(),
                    "dataset loaded"
                );
                let collection = Arc::new(collection);
                self.loaded
                    .insert(name.to_string(), Arc::clone(&collection));
                collection
            }
            Err(err) => {
                warn!(dataset = name, error = %err, "dataset load failed, serving empty collection");
                self.failures.record(name, err.to_string());
                Arc::new(empty_collection())
            }
        }
    }

    async fn fetch_and_parse(&self, name: &str) -> Result<FeatureCollection, DatasetError> {
        let body = self.fetcher.fetch(name).await?;
        let collection = body.parse::<FeatureCollection>()?;
        Ok(collection)
    }
}

fn empty_collection() -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: Vec::new(),
        foreign_members: None,
    }
}
