//! In-process renderer implementation.
//!
//! Serves two roles: the renderer behind headless sessions (CLI tooling,
//! integration tests), and the stand-in for a real GL engine when exercising
//! the reconciler. The [`RendererControl`] handle plays the part of the
//! engine's event loop: it completes the style load, raises source errors,
//! and can be told to reject specific layer mutations.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashSet;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tracing::debug;

use crate::descriptor::{LayerDescriptor, LayerId, LayerKind, SourceDescriptor, SourceId};

use super::{EngineKind, RendererError, RendererEvent, RendererHandle, TileUrlRewriter};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Drives the asynchronous half of a [`HeadlessRenderer`].
///
/// Cloneable and shareable; all clones observe and affect the same
/// renderer. Dropping the renderer leaves controls inert.
#[derive(Clone)]
pub struct RendererControl {
    shared: Arc<ControlShared>,
}

struct ControlShared {
    style_loaded: AtomicBool,
    events: broadcast::Sender<RendererEvent>,
    rejected_layers: DashSet<LayerId>,
}

impl RendererControl {
    /// Marks the base style as loaded and broadcasts
    /// [`RendererEvent::StyleLoaded`].
    pub fn complete_style_load(&self) {
        self.shared.style_loaded.store(true, Ordering::SeqCst);
        let _ = self.shared.events.send(RendererEvent::StyleLoaded);
    }

    /// Broadcasts a source failure, as a real engine would after a tile
    /// fetch error.
    pub fn emit_source_error(&self, source_id: Option<SourceId>, message: impl Into<String>) {
        let _ = self.shared.events.send(RendererEvent::SourceError {
            source_id,
            message: message.into(),
        });
    }

    /// Makes the next and every subsequent attempt to add this layer fail,
    /// until [`clear_rejections`](Self::clear_rejections) is called.
    pub fn reject_layer(&self, id: LayerId) {
        self.shared.rejected_layers.insert(id);
    }

    /// Clears all injected layer rejections.
    pub fn clear_rejections(&self) {
        self.shared.rejected_layers.clear();
    }
}

struct AppliedSource {
    engine_type: &'static str,
    resolved_url: Option<String>,
}

struct AppliedLayer {
    id: LayerId,
    kind: LayerKind,
    source: SourceId,
    layout: BTreeMap<String, Value>,
    paint: BTreeMap<String, Value>,
    filter: Option<Value>,
}

/// A renderer that applies mutations to in-memory state.
pub struct HeadlessRenderer {
    kind: EngineKind,
    access_token: Option<String>,
    rewriter: Option<TileUrlRewriter>,
    control: RendererControl,
    sources: HashMap<SourceId, AppliedSource>,
    layers: Vec<AppliedLayer>,
    mutations: u64,
}

impl HeadlessRenderer {
    /// Creates a renderer for the given engine.
    ///
    /// The style starts unloaded; call
    /// [`RendererControl::complete_style_load`] to finish mounting. The
    /// access token is required for any `mapbox://` tileset on either
    /// engine; on MapLibre it additionally feeds the URL rewriter.
    pub fn new(kind: EngineKind, access_token: Option<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let rewriter = match (kind, &access_token) {
            (EngineKind::MapLibre, Some(token)) => Some(TileUrlRewriter::new(token.clone())),
            _ => None,
        };
        Self {
            kind,
            access_token,
            rewriter,
            control: RendererControl {
                shared: Arc::new(ControlShared {
                    style_loaded: AtomicBool::new(false),
                    events,
                    rejected_layers: DashSet::new(),
                }),
            },
            sources: HashMap::new(),
            layers: Vec::new(),
            mutations: 0,
        }
    }

    /// Returns a control handle for this renderer.
    pub fn control(&self) -> RendererControl {
        self.control.clone()
    }

    /// Total number of mutations applied so far.
    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }

    /// The resolved URL a source was created with, after any rewriting.
    pub fn source_url(&self, id: &SourceId) -> Option<&str> {
        self.sources.get(id)?.resolved_url.as_deref()
    }

    /// The engine source type a source was created with.
    pub fn source_engine_type(&self, id: &SourceId) -> Option<&'static str> {
        Some(self.sources.get(id)?.engine_type)
    }

    /// A mounted layer's current layout property value.
    pub fn layout_property(&self, id: &LayerId, name: &str) -> Option<&Value> {
        let index = self.find_layer(id)?;
        self.layers[index].layout.get(name)
    }

    /// A mounted layer's current paint property value.
    pub fn paint_property(&self, id: &LayerId, name: &str) -> Option<&Value> {
        let index = self.find_layer(id)?;
        self.layers[index].paint.get(name)
    }

    /// A mounted layer's current feature filter.
    pub fn layer_filter(&self, id: &LayerId) -> Option<&Value> {
        let index = self.find_layer(id)?;
        self.layers[index].filter.as_ref()
    }

    /// A mounted layer's rendering kind.
    pub fn layer_kind(&self, id: &LayerId) -> Option<LayerKind> {
        let index = self.find_layer(id)?;
        Some(self.layers[index].kind)
    }

    fn find_layer(&self, id: &LayerId) -> Option<usize> {
        self.layers.iter().position(|layer| &layer.id == id)
    }

    fn require_loaded(&self) -> Result<(), RendererError> {
        if self.is_style_loaded() {
            Ok(())
        } else {
            Err(RendererError::StyleNotLoaded)
        }
    }

    fn resolve_url(&self, url: &str) -> Result<String, RendererError> {
        if url.starts_with("mapbox://") && self.access_token.is_none() {
            return Err(RendererError::MissingCredential);
        }
        match &self.rewriter {
            Some(rewriter) => Ok(rewriter.rewrite(url)),
            None => Ok(url.to_string()),
        }
    }
}

/// Layout map for a new layer: the descriptor's layout plus visibility.
fn effective_layout(layer: &LayerDescriptor) -> BTreeMap<String, Value> {
    let mut layout = layer.style.layout.clone();
    let visibility = if layer.visible { "visible" } else { "none" };
    layout.insert("visibility".to_string(), json!(visibility));
    layout
}

/// Paint map for a new layer: the descriptor's paint plus the kind-specific
/// opacity property. The descriptor's opacity wins over any opacity already
/// present in the style rule.
fn effective_paint(layer: &LayerDescriptor) -> BTreeMap<String, Value> {
    let mut paint = layer.style.paint.clone();
    paint.insert(layer.kind.opacity_property().to_string(), json!(layer.opacity));
    paint
}

impl RendererHandle for HeadlessRenderer {
    fn engine_kind(&self) -> EngineKind {
        self.kind
    }

    fn is_style_loaded(&self) -> bool {
        self.control.shared.style_loaded.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<RendererEvent> {
        self.control.shared.events.subscribe()
    }

    fn create_source(&mut self, source: &SourceDescriptor) -> Result<(), RendererError> {
        self.require_loaded()?;
        if self.sources.contains_key(&source.id) {
            return Err(RendererError::SourceExists(source.id.clone()));
        }
        let resolved_url = match source.data.url() {
            Some(url) => Some(self.resolve_url(url)?),
            None => None,
        };
        debug!(source = %source.id, kind = source.data.engine_type(), "create source");
        self.sources.insert(
            source.id.clone(),
            AppliedSource {
                engine_type: source.data.engine_type(),
                resolved_url,
            },
        );
        self.mutations += 1;
        Ok(())
    }

    fn remove_source(&mut self, id: &SourceId) -> Result<(), RendererError> {
        self.require_loaded()?;
        if let Some(layer) = self.layers.iter().find(|layer| &layer.source == id) {
            return Err(RendererError::SourceInUse(id.clone(), layer.id.clone()));
        }
        if self.sources.remove(id).is_none() {
            return Err(RendererError::UnknownSource(id.clone()));
        }
        debug!(source = %id, "remove source");
        self.mutations += 1;
        Ok(())
    }

    fn add_layer(
        &mut self,
        layer: &LayerDescriptor,
        before: Option<&LayerId>,
    ) -> Result<(), RendererError> {
        self.require_loaded()?;
        if self.find_layer(&layer.id).is_some() {
            return Err(RendererError::LayerExists(layer.id.clone()));
        }
        if !self.sources.contains_key(&layer.source) {
            return Err(RendererError::UnknownSource(layer.source.clone()));
        }
        if self.control.shared.rejected_layers.contains(&layer.id) {
            return Err(RendererError::EngineFailure(format!(
                "layer '{}' rejected by engine",
                layer.id
            )));
        }
        let position = match before {
            Some(before_id) => self
                .find_layer(before_id)
                .ok_or_else(|| RendererError::UnknownLayer(before_id.clone()))?,
            None => self.layers.len(),
        };
        debug!(layer = %layer.id, kind = %layer.kind, position, "add layer");
        self.layers.insert(
            position,
            AppliedLayer {
                id: layer.id.clone(),
                kind: layer.kind,
                source: layer.source.clone(),
                layout: effective_layout(layer),
                paint: effective_paint(layer),
                filter: layer.style.filter.clone(),
            },
        );
        self.mutations += 1;
        Ok(())
    }

    fn remove_layer(&mut self, id: &LayerId) -> Result<(), RendererError> {
        self.require_loaded()?;
        let index = self
            .find_layer(id)
            .ok_or_else(|| RendererError::UnknownLayer(id.clone()))?;
        debug!(layer = %id, "remove layer");
        self.layers.remove(index);
        self.mutations += 1;
        Ok(())
    }

    fn set_layout_property(
        &mut self,
        id: &LayerId,
        name: &str,
        value: &Value,
    ) -> Result<(), RendererError> {
        self.require_loaded()?;
        let index = self
            .find_layer(id)
            .ok_or_else(|| RendererError::UnknownLayer(id.clone()))?;
        self.layers[index]
            .layout
            .insert(name.to_string(), value.clone());
        self.mutations += 1;
        Ok(())
    }

    fn set_paint_property(
        &mut self,
        id: &LayerId,
        name: &str,
        value: &Value,
    ) -> Result<(), RendererError> {
        self.require_loaded()?;
        let index = self
            .find_layer(id)
            .ok_or_else(|| RendererError::UnknownLayer(id.clone()))?;
        self.layers[index]
            .paint
            .insert(name.to_string(), value.clone());
        self.mutations += 1;
        Ok(())
    }

    fn set_filter(&mut self, id: &LayerId, filter: Option<&Value>) -> Result<(), RendererError> {
        self.require_loaded()?;
        let index = self
            .find_layer(id)
            .ok_or_else(|| RendererError::UnknownLayer(id.clone()))?;
        self.layers[index].filter = filter.cloned();
        self.mutations += 1;
        Ok(())
    }

    fn has_source(&self, id: &SourceId) -> bool {
        self.sources.contains_key(id)
    }

    fn has_layer(&self, id: &LayerId) -> bool {
        self.find_layer(id).is_some()
    }

    fn layer_order(&self) -> Vec<LayerId> {
        self.layers.iter().map(|layer| layer.id.clone()).collect()
    }
}
