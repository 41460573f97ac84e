//! Source descriptors for tile and feature data.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a data source.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(String);

impl SourceId {
    /// Creates a source id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceId({})", self.0)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Where a source's data comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SourceData {
    /// Vector tiles addressed by a tileset URL, typically a `mapbox://`
    /// scheme URL that engine adapters rewrite for their own fetch path.
    VectorTiles {
        /// Tileset URL.
        url: String,
    },
    /// GeoJSON features fetched from a URL.
    GeoJsonUrl {
        /// Document URL, absolute or site-relative.
        url: String,
    },
    /// GeoJSON features carried inline in the descriptor itself.
    GeoJsonInline {
        /// The feature collection as raw JSON.
        data: serde_json::Value,
    },
    /// Raster digital-elevation-model tiles for terrain and hillshade.
    RasterDem {
        /// Tileset URL.
        url: String,
        /// Tile edge length in pixels.
        tile_size: u32,
        /// Maximum zoom level the tileset provides.
        max_zoom: u8,
    },
    /// Plain raster imagery tiles.
    RasterTiles {
        /// Tileset URL.
        url: String,
    },
}

impl SourceData {
    /// Returns the engine source type string for this variant.
    pub fn engine_type(&self) -> &'static str {
        match self {
            SourceData::VectorTiles { .. } => "vector",
            SourceData::GeoJsonUrl { .. } | SourceData::GeoJsonInline { .. } => "geojson",
            SourceData::RasterDem { .. } => "raster-dem",
            SourceData::RasterTiles { .. } => "raster",
        }
    }

    /// Returns the remote URL, if this source fetches from one.
    pub fn url(&self) -> Option<&str> {
        match self {
            SourceData::VectorTiles { url }
            | SourceData::GeoJsonUrl { url }
            | SourceData::RasterDem { url, .. }
            | SourceData::RasterTiles { url } => Some(url),
            SourceData::GeoJsonInline { .. } => None,
        }
    }
}

/// Complete declarative description of one data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Stable identity for this source.
    pub id: SourceId,
    /// Where the data comes from.
    pub data: SourceData,
}

impl SourceDescriptor {
    /// Creates a source descriptor.
    pub fn new(id: impl Into<SourceId>, data: SourceData) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Creates a vector tile source.
    pub fn vector_tiles(id: impl Into<SourceId>, url: impl Into<String>) -> Self {
        Self::new(id, SourceData::VectorTiles { url: url.into() })
    }

    /// Creates a GeoJSON source backed by a URL.
    pub fn geojson_url(id: impl Into<SourceId>, url: impl Into<String>) -> Self {
        Self::new(id, SourceData::GeoJsonUrl { url: url.into() })
    }

    /// Creates a GeoJSON source carrying its data inline.
    pub fn geojson_inline(id: impl Into<SourceId>, data: serde_json::Value) -> Self {
        Self::new(id, SourceData::GeoJsonInline { data })
    }

    /// Creates a raster DEM source for terrain rendering.
    pub fn raster_dem(
        id: impl Into<SourceId>,
        url: impl Into<String>,
        tile_size: u32,
        max_zoom: u8,
    ) -> Self {
        Self::new(
            id,
            SourceData::RasterDem {
                url: url.into(),
                tile_size,
                max_zoom,
            },
        )
    }
}
