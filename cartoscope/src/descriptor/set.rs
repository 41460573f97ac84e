//! Descriptor sets: the complete desired state of a map.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{LayerDescriptor, LayerId, SourceDescriptor, SourceId};

/// Errors raised while building or validating a descriptor set.
///
/// `Display` and `Error` are implemented by hand because the `source`
/// field of [`DescriptorError::UnknownSource`] is domain data, not an
/// error cause, and `thiserror` would treat a field with that name as
/// the `Error::source`.
#[derive(Debug, PartialEq)]
pub enum DescriptorError {
    /// A layer references a source id that the set does not contain.
    UnknownSource { layer: LayerId, source: SourceId },

    /// Two layers in the set carry the same id.
    DuplicateLayer(LayerId),

    /// Two sources in the set carry the same id.
    DuplicateSource(SourceId),
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorError::UnknownSource { layer, source } => {
                write!(f, "layer '{layer}' references unknown source '{source}'")
            }
            DescriptorError::DuplicateLayer(id) => write!(f, "duplicate layer id '{id}'"),
            DescriptorError::DuplicateSource(id) => write!(f, "duplicate source id '{id}'"),
        }
    }
}

impl std::error::Error for DescriptorError {}

/// The full set of sources and layers a map should display.
///
/// A descriptor set is a self-contained snapshot of desired state: every
/// layer's source reference resolves within the set, and layers carry their
/// own depth hints. Sets are cheap to clone and compare, which is what makes
/// them suitable for publish-latest channels where intermediate states may
/// be skipped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DescriptorSet {
    sources: Vec<SourceDescriptor>,
    layers: Vec<LayerDescriptor>,
}

impl DescriptorSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a source to the set.
    pub fn with_source(mut self, source: SourceDescriptor) -> Self {
        self.sources.push(source);
        self
    }

    /// Adds a layer to the set.
    pub fn with_layer(mut self, layer: LayerDescriptor) -> Self {
        self.layers.push(layer);
        self
    }

    /// Returns the sources in insertion order.
    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    /// Returns the layers in insertion order.
    pub fn layers(&self) -> &[LayerDescriptor] {
        &self.layers
    }

    /// Looks up a layer by id.
    pub fn layer(&self, id: &LayerId) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|l| &l.id == id)
    }

    /// Looks up a source by id.
    pub fn source(&self, id: &SourceId) -> Option<&SourceDescriptor> {
        self.sources.iter().find(|s| &s.id == id)
    }

    /// Returns true if the set contains no layers and no sources.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.layers.is_empty()
    }

    /// Checks internal consistency: unique ids and resolvable references.
    ///
    /// # Returns
    ///
    /// `Ok(())` when every layer id and source id is unique and every layer
    /// references a source present in the set.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        let mut layer_ids = HashSet::new();
        for layer in &self.layers {
            if !layer_ids.insert(&layer.id) {
                return Err(DescriptorError::DuplicateLayer(layer.id.clone()));
            }
        }

        let mut source_ids = HashSet::new();
        for source in &self.sources {
            if !source_ids.insert(&source.id) {
                return Err(DescriptorError::DuplicateSource(source.id.clone()));
            }
        }

        for layer in &self.layers {
            if !source_ids.contains(&layer.source) {
                return Err(DescriptorError::UnknownSource {
                    layer: layer.id.clone(),
                    source: layer.source.clone(),
                });
            }
        }

        Ok(())
    }

    /// Returns the layers in paint order: descending depth hint, with ties
    /// keeping their insertion order.
    ///
    /// Higher hints paint first and end up further back, so background
    /// layers carry large hints and foreground annotations small ones.
    pub fn layers_in_paint_order(&self) -> Vec<&LayerDescriptor> {
        let mut ordered: Vec<&LayerDescriptor> = self.layers.iter().collect();
        ordered.sort_by(|a, b| b.z_order_hint.cmp(&a.z_order_hint));
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{LayerKind, SourceData};

    fn streets_source() -> SourceDescriptor {
        SourceDescriptor::vector_tiles("streets", "mapbox://mapbox.mapbox-streets-v8")
    }

    #[test]
    fn test_empty_set_validates() {
        assert_eq!(DescriptorSet::new().validate(), Ok(()));
        assert!(DescriptorSet::new().is_empty());
    }

    #[test]
    fn test_valid_set() {
        let set = DescriptorSet::new()
            .with_source(streets_source())
            .with_layer(LayerDescriptor::new("roads", LayerKind::Line, "streets"));
        assert_eq!(set.validate(), Ok(()));
        assert!(!set.is_empty());
    }

    #[test]
    fn test_unknown_source_rejected() {
        let set = DescriptorSet::new()
            .with_layer(LayerDescriptor::new("roads", LayerKind::Line, "missing"));
        assert_eq!(
            set.validate(),
            Err(DescriptorError::UnknownSource {
                layer: LayerId::new("roads"),
                source: SourceId::new("missing"),
            })
        );
    }

    #[test]
    fn test_duplicate_layer_rejected() {
        let set = DescriptorSet::new()
            .with_source(streets_source())
            .with_layer(LayerDescriptor::new("roads", LayerKind::Line, "streets"))
            .with_layer(LayerDescriptor::new("roads", LayerKind::Circle, "streets"));
        assert_eq!(
            set.validate(),
            Err(DescriptorError::DuplicateLayer(LayerId::new("roads")))
        );
    }

    #[test]
    fn test_duplicate_source_rejected() {
        let set = DescriptorSet::new()
            .with_source(streets_source())
            .with_source(SourceDescriptor::new(
                "streets",
                SourceData::RasterTiles {
                    url: "https://example.com/{z}/{x}/{y}.png".to_string(),
                },
            ));
        assert_eq!(
            set.validate(),
            Err(DescriptorError::DuplicateSource(SourceId::new("streets")))
        );
    }

    #[test]
    fn test_paint_order_descends_by_hint() {
        let set = DescriptorSet::new()
            .with_source(streets_source())
            .with_layer(
                LayerDescriptor::new("labels", LayerKind::Symbol, "streets").with_z_order_hint(0),
            )
            .with_layer(
                LayerDescriptor::new("terrain", LayerKind::Raster, "streets")
                    .with_z_order_hint(100),
            )
            .with_layer(
                LayerDescriptor::new("roads", LayerKind::Line, "streets").with_z_order_hint(50),
            );

        let order: Vec<&str> = set
            .layers_in_paint_order()
            .iter()
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(order, vec!["terrain", "roads", "labels"]);
    }

    #[test]
    fn test_paint_order_ties_keep_insertion_order() {
        let set = DescriptorSet::new()
            .with_source(streets_source())
            .with_layer(LayerDescriptor::new("a", LayerKind::Circle, "streets"))
            .with_layer(LayerDescriptor::new("b", LayerKind::Circle, "streets"))
            .with_layer(LayerDescriptor::new("c", LayerKind::Circle, "streets"));

        let order: Vec<&str> = set
            .layers_in_paint_order()
            .iter()
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_lookup_by_id() {
        let set = DescriptorSet::new()
            .with_source(streets_source())
            .with_layer(LayerDescriptor::new("roads", LayerKind::Line, "streets"));
        assert!(set.layer(&LayerId::new("roads")).is_some());
        assert!(set.layer(&LayerId::new("rails")).is_none());
        assert!(set.source(&SourceId::new("streets")).is_some());
    }
}
