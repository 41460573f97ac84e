//! The reconciler: plans and applies minimal mutation sets.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::descriptor::{
    DescriptorError, DescriptorSet, LayerDescriptor, LayerId, SourceDescriptor, SourceId,
};
use crate::renderer::{RendererError, RendererEvent, RendererHandle};

use super::{Mutation, RendererLifecycle, RendererState};

/// Errors raised by reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The desired descriptor set is internally inconsistent.
    #[error("invalid descriptor set: {0}")]
    InvalidSet(#[from] DescriptorError),

    /// The renderer previously failed; only an engine swap recovers it.
    #[error("renderer is in error state: {0}")]
    Faulted(String),

    /// A planned mutation was rejected by the renderer. Mutations applied
    /// before this one remain in effect.
    #[error("mutation '{mutation}' failed: {source}")]
    MutationFailed {
        mutation: String,
        #[source]
        source: RendererError,
    },
}

/// Keeps one renderer synchronized with a declarative descriptor set.
///
/// The reconciler owns its renderer exclusively; nothing else mutates the
/// renderer while the reconciler lives. Desired state handed to
/// [`sync`](Self::sync) before the style has loaded is buffered latest-wins
/// and flushed on the loaded signal, so rapid early state changes collapse
/// into one materialized set.
pub struct Reconciler<R: RendererHandle> {
    renderer: R,
    lifecycle: RendererLifecycle,
    error_message: Option<String>,
    applied_sources: BTreeMap<SourceId, SourceDescriptor>,
    applied_layers: BTreeMap<LayerId, LayerDescriptor>,
    pending: Option<DescriptorSet>,
    last_desired: Option<DescriptorSet>,
}

impl<R: RendererHandle> Reconciler<R> {
    /// Takes ownership of a renderer and starts tracking its lifecycle.
    ///
    /// A renderer whose style is already loaded mounts straight to `Ready`;
    /// otherwise the reconciler waits for
    /// [`RendererEvent::StyleLoaded`] via [`handle_event`](Self::handle_event).
    pub fn mount(renderer: R) -> Self {
        let mut reconciler = Self {
            renderer,
            lifecycle: RendererLifecycle::Uninitialized,
            error_message: None,
            applied_sources: BTreeMap::new(),
            applied_layers: BTreeMap::new(),
            pending: None,
            last_desired: None,
        };
        reconciler.advance(RendererLifecycle::StyleLoading);
        if reconciler.renderer.is_style_loaded() {
            reconciler.advance(RendererLifecycle::Ready);
        }
        info!(
            engine = %reconciler.renderer.engine_kind(),
            lifecycle = %reconciler.lifecycle,
            "renderer mounted"
        );
        reconciler
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> RendererLifecycle {
        self.lifecycle
    }

    /// Failure description, once the lifecycle has reached `Error`.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Read access to the owned renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Snapshot of lifecycle and applied ids.
    pub fn state(&self) -> RendererState {
        RendererState {
            engine: self.renderer.engine_kind(),
            lifecycle: self.lifecycle,
            error_message: self.error_message.clone(),
            active_source_ids: self.applied_sources.keys().cloned().collect(),
            active_layer_ids: self.renderer.layer_order(),
        }
    }

    /// Brings the renderer in line with `desired`.
    ///
    /// Idempotent: syncing a set the renderer already matches applies
    /// nothing and returns an empty plan. Before the style has loaded the
    /// set is buffered instead, replacing any earlier buffered set.
    ///
    /// # Returns
    ///
    /// The mutations actually applied, in order. On a mutation failure the
    /// lifecycle moves to `Error`, already-applied mutations stay live, and
    /// the failure is returned.
    pub fn sync(&mut self, desired: &DescriptorSet) -> Result<Vec<Mutation>, ReconcileError> {
        desired.validate()?;
        self.last_desired = Some(desired.clone());
        match self.lifecycle {
            RendererLifecycle::Error => Err(ReconcileError::Faulted(
                self.error_message
                    .clone()
                    .unwrap_or_else(|| "renderer failed".to_string()),
            )),
            RendererLifecycle::Uninitialized | RendererLifecycle::StyleLoading => {
                debug!(
                    layers = desired.layers().len(),
                    "style not loaded, buffering desired state"
                );
                self.pending = Some(desired.clone());
                Ok(Vec::new())
            }
            RendererLifecycle::Ready => {
                let plan = self.plan_against_applied(desired);
                self.apply(plan)
            }
        }
    }

    /// Computes the mutations [`sync`](Self::sync) would apply, without
    /// touching the renderer.
    pub fn plan(&self, desired: &DescriptorSet) -> Result<Vec<Mutation>, ReconcileError> {
        desired.validate()?;
        Ok(self.plan_against_applied(desired))
    }

    /// Feeds an asynchronous renderer notification into the lifecycle.
    ///
    /// `StyleLoaded` moves a loading renderer to `Ready` and flushes the
    /// buffered descriptor set, returning whatever that flush applied.
    /// `SourceError` parks the lifecycle in `Error`, leaving applied layers
    /// intact.
    pub fn handle_event(&mut self, event: &RendererEvent) -> Result<Vec<Mutation>, ReconcileError> {
        match event {
            RendererEvent::StyleLoaded => {
                if self.lifecycle == RendererLifecycle::StyleLoading {
                    self.advance(RendererLifecycle::Ready);
                    if let Some(pending) = self.pending.take() {
                        info!(
                            layers = pending.layers().len(),
                            "flushing buffered descriptor set"
                        );
                        return self.sync(&pending);
                    }
                }
                Ok(Vec::new())
            }
            RendererEvent::SourceError { .. } => {
                if let Some(message) = event.health_message() {
                    self.fail(message);
                }
                Ok(Vec::new())
            }
        }
    }

    /// Replaces the renderer wholesale and rebuilds from scratch.
    ///
    /// The old renderer is dropped with everything mounted on it; no state
    /// migrates. The most recent desired set is replayed against the new
    /// engine, which also clears a previous error state.
    pub fn swap_engine(&mut self, renderer: R) -> Result<Vec<Mutation>, ReconcileError> {
        info!(
            from = %self.renderer.engine_kind(),
            to = %renderer.engine_kind(),
            "engine swap, tearing down renderer state"
        );
        self.renderer = renderer;
        self.lifecycle = RendererLifecycle::Uninitialized;
        self.error_message = None;
        self.applied_sources.clear();
        self.applied_layers.clear();
        self.pending = None;
        self.advance(RendererLifecycle::StyleLoading);
        if self.renderer.is_style_loaded() {
            self.advance(RendererLifecycle::Ready);
        }
        match self.last_desired.clone() {
            Some(desired) => self.sync(&desired),
            None => Ok(Vec::new()),
        }
    }

    fn advance(&mut self, next: RendererLifecycle) {
        if self.lifecycle.can_transition_to(next) {
            debug!(from = %self.lifecycle, to = %next, "lifecycle transition");
            self.lifecycle = next;
        } else if self.lifecycle != next {
            warn!(from = %self.lifecycle, to = %next, "refused lifecycle transition");
        }
    }

    fn fail(&mut self, message: String) {
        error!(message = %message, "renderer entered error state");
        self.advance(RendererLifecycle::Error);
        if self.error_message.is_none() {
            self.error_message = Some(message);
        }
    }

    /// Diffs `desired` against applied state. Plan order honors the source
    /// dependency rules: dying layers first, then dying sources, then new
    /// sources, then new layers, then in-place patches.
    fn plan_against_applied(&self, desired: &DescriptorSet) -> Vec<Mutation> {
        let mut mutations = Vec::new();

        // A source whose definition changed cannot be patched in place; it
        // is torn down and recreated along with every layer reading it.
        let rebuilt_sources: BTreeSet<SourceId> = self
            .applied_sources
            .iter()
            .filter(|(id, applied)| {
                desired
                    .source(id)
                    .is_some_and(|want| want != *applied)
            })
            .map(|(id, _)| id.clone())
            .collect();

        let needs_add = |want: &LayerDescriptor| -> bool {
            match self.applied_layers.get(&want.id) {
                None => true,
                Some(applied) => {
                    structural_change(applied, want)
                        || rebuilt_sources.contains(&applied.source)
                        || rebuilt_sources.contains(&want.source)
                }
            }
        };

        let mut removed_layers: BTreeSet<LayerId> = BTreeSet::new();
        for id in self.applied_layers.keys() {
            let remove = match desired.layer(id) {
                None => true,
                Some(want) => needs_add(want),
            };
            if remove {
                removed_layers.insert(id.clone());
                mutations.push(Mutation::RemoveLayer(id.clone()));
            }
        }

        for id in self.applied_sources.keys() {
            if desired.source(id).is_none() || rebuilt_sources.contains(id) {
                mutations.push(Mutation::RemoveSource(id.clone()));
            }
        }

        for source in desired.sources() {
            if !self.applied_sources.contains_key(&source.id)
                || rebuilt_sources.contains(&source.id)
            {
                mutations.push(Mutation::CreateSource(source.clone()));
            }
        }

        // Additions walk the desired set background-first and slot each new
        // layer before the first mounted layer with a smaller depth hint, so
        // equal hints keep their existing relative order.
        let mut order: Vec<(LayerId, i32)> = self
            .renderer
            .layer_order()
            .into_iter()
            .filter(|id| !removed_layers.contains(id))
            .filter_map(|id| {
                let hint = self.applied_layers.get(&id)?.z_order_hint;
                Some((id, hint))
            })
            .collect();

        for want in desired.layers_in_paint_order() {
            if !needs_add(want) {
                continue;
            }
            let position = order
                .iter()
                .position(|(_, hint)| *hint < want.z_order_hint);
            let before = position.map(|index| order[index].0.clone());
            order.insert(
                position.unwrap_or(order.len()),
                (want.id.clone(), want.z_order_hint),
            );
            mutations.push(Mutation::AddLayer {
                layer: want.clone(),
                before,
            });
        }

        for want in desired.layers() {
            if needs_add(want) {
                continue;
            }
            if let Some(applied) = self.applied_layers.get(&want.id) {
                diff_layer(applied, want, &mut mutations);
            }
        }

        mutations
    }

    fn apply(&mut self, plan: Vec<Mutation>) -> Result<Vec<Mutation>, ReconcileError> {
        let mut applied = Vec::with_capacity(plan.len());
        for mutation in plan {
            if let Err(source) = self.apply_one(&mutation) {
                let description = mutation.to_string();
                self.fail(format!("{description}: {source}"));
                return Err(ReconcileError::MutationFailed {
                    mutation: description,
                    source,
                });
            }
            applied.push(mutation);
        }
        if !applied.is_empty() {
            debug!(mutations = applied.len(), "sync applied");
        }
        Ok(applied)
    }

    fn apply_one(&mut self, mutation: &Mutation) -> Result<(), RendererError> {
        match mutation {
            Mutation::CreateSource(source) => {
                self.renderer.create_source(source)?;
                self.applied_sources.insert(source.id.clone(), source.clone());
            }
            Mutation::RemoveSource(id) => {
                self.renderer.remove_source(id)?;
                self.applied_sources.remove(id);
            }
            Mutation::AddLayer { layer, before } => {
                self.renderer.add_layer(layer, before.as_ref())?;
                self.applied_layers.insert(layer.id.clone(), layer.clone());
            }
            Mutation::RemoveLayer(id) => {
                self.renderer.remove_layer(id)?;
                self.applied_layers.remove(id);
            }
            Mutation::SetVisibility { layer, visible } => {
                let value = json!(if *visible { "visible" } else { "none" });
                self.renderer.set_layout_property(layer, "visibility", &value)?;
                if let Some(entry) = self.applied_layers.get_mut(layer) {
                    entry.visible = *visible;
                }
            }
            Mutation::SetOpacity {
                layer,
                kind,
                opacity,
            } => {
                self.renderer
                    .set_paint_property(layer, kind.opacity_property(), &json!(*opacity))?;
                if let Some(entry) = self.applied_layers.get_mut(layer) {
                    entry.opacity = *opacity;
                }
            }
            Mutation::SetPaint { layer, name, value } => {
                self.renderer.set_paint_property(layer, name, value)?;
                if let Some(entry) = self.applied_layers.get_mut(layer) {
                    if value.is_null() {
                        entry.style.paint.remove(name);
                    } else {
                        entry.style.paint.insert(name.clone(), value.clone());
                    }
                }
            }
            Mutation::SetLayout { layer, name, value } => {
                self.renderer.set_layout_property(layer, name, value)?;
                if let Some(entry) = self.applied_layers.get_mut(layer) {
                    if value.is_null() {
                        entry.style.layout.remove(name);
                    } else {
                        entry.style.layout.insert(name.clone(), value.clone());
                    }
                }
            }
            Mutation::SetFilter { layer, filter } => {
                self.renderer.set_filter(layer, filter.as_ref())?;
                if let Some(entry) = self.applied_layers.get_mut(layer) {
                    entry.style.filter = filter.clone();
                }
            }
        }
        Ok(())
    }
}

/// Changes that cannot be patched in place and force a remove-and-re-add.
fn structural_change(applied: &LayerDescriptor, want: &LayerDescriptor) -> bool {
    applied.kind != want.kind
        || applied.source != want.source
        || applied.source_layer != want.source_layer
        || applied.z_order_hint != want.z_order_hint
}

/// Emits in-place patches for a layer that stays mounted.
fn diff_layer(applied: &LayerDescriptor, want: &LayerDescriptor, mutations: &mut Vec<Mutation>) {
    if applied.visible != want.visible {
        mutations.push(Mutation::SetVisibility {
            layer: want.id.clone(),
            visible: want.visible,
        });
    }
    if applied.opacity != want.opacity {
        mutations.push(Mutation::SetOpacity {
            layer: want.id.clone(),
            kind: want.kind,
            opacity: want.opacity,
        });
    }
    for (name, value) in &want.style.paint {
        if applied.style.paint.get(name) != Some(value) {
            mutations.push(Mutation::SetPaint {
                layer: want.id.clone(),
                name: name.clone(),
                value: value.clone(),
            });
        }
    }
    for name in applied.style.paint.keys() {
        if !want.style.paint.contains_key(name) {
            mutations.push(Mutation::SetPaint {
                layer: want.id.clone(),
                name: name.clone(),
                value: Value::Null,
            });
        }
    }
    for (name, value) in &want.style.layout {
        if applied.style.layout.get(name) != Some(value) {
            mutations.push(Mutation::SetLayout {
                layer: want.id.clone(),
                name: name.clone(),
                value: value.clone(),
            });
        }
    }
    for name in applied.style.layout.keys() {
        if !want.style.layout.contains_key(name) {
            mutations.push(Mutation::SetLayout {
                layer: want.id.clone(),
                name: name.clone(),
                value: Value::Null,
            });
        }
    }
    if applied.style.filter != want.style.filter {
        mutations.push(Mutation::SetFilter {
            layer: want.id.clone(),
            filter: want.style.filter.clone(),
        });
    }
}
