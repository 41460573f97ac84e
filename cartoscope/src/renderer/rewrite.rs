//! Tileset URL rewriting for engines without native `mapbox://` support.

/// Rewrites `mapbox://` tileset URLs into direct tile-API requests.
///
/// The Mapbox engine resolves its own scheme and injects credentials itself;
/// the MapLibre engine fetches plain HTTPS and needs every `mapbox://`
/// tileset turned into a v4 TileJSON URL with the access token appended.
/// The transform is pure and applied inside the engine handle, so callers
/// keep writing `mapbox://` locations regardless of the active engine.
///
/// # Example
///
/// ```ignore
/// let rewriter = TileUrlRewriter::new("pk.abc123");
/// assert_eq!(
///     rewriter.rewrite("mapbox://mapbox.mapbox-streets-v8"),
///     "https://api.mapbox.com/v4/mapbox.mapbox-streets-v8.json?secure&access_token=pk.abc123"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct TileUrlRewriter {
    access_token: String,
}

impl TileUrlRewriter {
    /// Creates a rewriter that appends the given access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    /// Rewrites a `mapbox://` URL; any other URL passes through unchanged.
    pub fn rewrite(&self, url: &str) -> String {
        match url.strip_prefix("mapbox://") {
            Some(tileset) => format!(
                "https://api.mapbox.com/v4/{tileset}.json?secure&access_token={}",
                self.access_token
            ),
            None => url.to_string(),
        }
    }
}
