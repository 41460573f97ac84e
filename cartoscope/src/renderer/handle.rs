//! The renderer mutation contract.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::descriptor::{LayerDescriptor, LayerId, SourceDescriptor, SourceId};

use super::{RendererError, RendererEvent};

/// The concrete rendering engine behind a handle.
///
/// Both engines honor the same mutation contract; they differ only in how
/// tileset URLs are resolved. Swapping engines is a full teardown and
/// rebuild, never a partial migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Mapbox GL: resolves `mapbox://` tileset URLs natively.
    Mapbox,
    /// MapLibre GL: needs `mapbox://` URLs rewritten to the tile API.
    MapLibre,
}

impl EngineKind {
    /// Returns the engine name as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Mapbox => "mapbox",
            EngineKind::MapLibre => "maplibre",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Imperative mutation surface of one mounted rendering engine.
///
/// The reconciliation engine is the only caller: it owns the handle
/// exclusively and serializes all mutations through it. Mutations are
/// synchronous and return an error on failure; they never retry internally.
///
/// Implementations translate descriptor fields into whatever the engine
/// expects, including resolving tileset URLs for their own fetch path. A
/// layer's `visible` flag becomes the `visibility` layout property and its
/// `opacity` becomes the kind-specific opacity paint property, so the
/// reconciler can later patch either without knowing engine conventions.
pub trait RendererHandle: Send {
    /// Which engine this handle drives.
    fn engine_kind(&self) -> EngineKind;

    /// Whether the base style has finished loading.
    ///
    /// Mutations before this returns true fail with
    /// [`RendererError::StyleNotLoaded`].
    fn is_style_loaded(&self) -> bool;

    /// Subscribes to asynchronous renderer notifications.
    fn subscribe(&self) -> broadcast::Receiver<RendererEvent>;

    /// Creates a source. Fails if the id is taken or the style is not
    /// loaded.
    fn create_source(&mut self, source: &SourceDescriptor) -> Result<(), RendererError>;

    /// Removes a source. Fails while any layer still references it.
    fn remove_source(&mut self, id: &SourceId) -> Result<(), RendererError>;

    /// Adds a layer, optionally positioned immediately before an existing
    /// layer in paint order. With `before = None` the layer paints last,
    /// on top of everything.
    fn add_layer(
        &mut self,
        layer: &LayerDescriptor,
        before: Option<&LayerId>,
    ) -> Result<(), RendererError>;

    /// Removes a layer.
    fn remove_layer(&mut self, id: &LayerId) -> Result<(), RendererError>;

    /// Patches one layout property on a mounted layer.
    fn set_layout_property(
        &mut self,
        id: &LayerId,
        name: &str,
        value: &Value,
    ) -> Result<(), RendererError>;

    /// Patches one paint property on a mounted layer.
    fn set_paint_property(
        &mut self,
        id: &LayerId,
        name: &str,
        value: &Value,
    ) -> Result<(), RendererError>;

    /// Replaces or clears a layer's feature filter.
    fn set_filter(&mut self, id: &LayerId, filter: Option<&Value>) -> Result<(), RendererError>;

    /// Whether a source with this id exists.
    fn has_source(&self, id: &SourceId) -> bool;

    /// Whether a layer with this id exists.
    fn has_layer(&self, id: &LayerId) -> bool;

    /// The mounted layers in paint order, first-painted first.
    fn layer_order(&self) -> Vec<LayerId>;
}
