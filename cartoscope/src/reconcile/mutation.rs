//! Planned renderer mutations.

use std::fmt;

use serde_json::Value;

use crate::descriptor::{LayerDescriptor, LayerId, LayerKind, SourceDescriptor, SourceId};

/// One renderer mutation in a reconciliation plan.
///
/// A plan is ordered: layer removals come before the removal of any source
/// they reference, and source creations come before the layers that read
/// from them.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Create a source.
    CreateSource(SourceDescriptor),
    /// Remove a source that no desired layer references anymore.
    RemoveSource(SourceId),
    /// Add a layer, optionally before an existing layer in paint order.
    AddLayer {
        layer: LayerDescriptor,
        before: Option<LayerId>,
    },
    /// Remove a layer.
    RemoveLayer(LayerId),
    /// Patch a mounted layer's visibility in place.
    SetVisibility { layer: LayerId, visible: bool },
    /// Patch a mounted layer's opacity in place, via the paint property
    /// its kind carries opacity on.
    SetOpacity {
        layer: LayerId,
        kind: LayerKind,
        opacity: f64,
    },
    /// Patch one paint property. A `null` value clears the property.
    SetPaint {
        layer: LayerId,
        name: String,
        value: Value,
    },
    /// Patch one layout property. A `null` value clears the property.
    SetLayout {
        layer: LayerId,
        name: String,
        value: Value,
    },
    /// Replace or clear a mounted layer's feature filter.
    SetFilter {
        layer: LayerId,
        filter: Option<Value>,
    },
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::CreateSource(source) => write!(f, "create source '{}'", source.id),
            Mutation::RemoveSource(id) => write!(f, "remove source '{id}'"),
            Mutation::AddLayer { layer, before } => match before {
                Some(before) => write!(f, "add layer '{}' before '{before}'", layer.id),
                None => write!(f, "add layer '{}'", layer.id),
            },
            Mutation::RemoveLayer(id) => write!(f, "remove layer '{id}'"),
            Mutation::SetVisibility { layer, visible } => {
                write!(f, "set layer '{layer}' visibility {}", if *visible { "visible" } else { "none" })
            }
            Mutation::SetOpacity { layer, opacity, .. } => {
                write!(f, "set layer '{layer}' opacity {opacity}")
            }
            Mutation::SetPaint { layer, name, .. } => {
                write!(f, "set layer '{layer}' paint '{name}'")
            }
            Mutation::SetLayout { layer, name, .. } => {
                write!(f, "set layer '{layer}' layout '{name}'")
            }
            Mutation::SetFilter { layer, filter } => match filter {
                Some(_) => write!(f, "set layer '{layer}' filter"),
                None => write!(f, "clear layer '{layer}' filter"),
            },
        }
    }
}
