//! Layer descriptors and layer identity.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SourceId;

/// Unique identifier for a map layer.
///
/// Layer ids are stable strings such as `"pd-healthcare"` or
/// `"contour-lines"`. Identity is what reconciliation keys on: a descriptor
/// carrying a known id updates that layer in place, while an unknown id
/// mounts a new one.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(String);

impl LayerId {
    /// Creates a layer id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerId({})", self.0)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The rendering primitive a layer draws with.
///
/// The kind decides which engine paint property carries the layer's opacity
/// and cannot change after the layer is mounted; changing a layer's kind
/// means removing it and mounting a replacement under the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerKind {
    /// Filled polygons.
    Fill,
    /// Stroked lines.
    Line,
    /// Point markers rendered as circles.
    Circle,
    /// Text and icon labels.
    Symbol,
    /// 3D extruded polygons.
    Extrusion,
    /// Raster imagery or hillshade tiles.
    Raster,
}

impl LayerKind {
    /// Returns the engine paint property that carries opacity for this kind.
    pub fn opacity_property(&self) -> &'static str {
        match self {
            LayerKind::Fill => "fill-opacity",
            LayerKind::Line => "line-opacity",
            LayerKind::Circle => "circle-opacity",
            LayerKind::Symbol => "text-opacity",
            LayerKind::Extrusion => "fill-extrusion-opacity",
            LayerKind::Raster => "raster-opacity",
        }
    }

    /// Returns the engine layer type string for this kind.
    pub fn engine_type(&self) -> &'static str {
        match self {
            LayerKind::Fill => "fill",
            LayerKind::Line => "line",
            LayerKind::Circle => "circle",
            LayerKind::Symbol => "symbol",
            LayerKind::Extrusion => "fill-extrusion",
            LayerKind::Raster => "raster",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.engine_type())
    }
}

/// Paint and layout properties plus an optional feature filter.
///
/// Properties are stored as raw JSON values in sorted maps so that two rules
/// built from the same inputs compare equal and serialize identically, which
/// is what lets reconciliation detect style changes by comparison alone.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StyleRule {
    /// Paint properties (colors, widths, opacities) keyed by property name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub paint: BTreeMap<String, Value>,
    /// Layout properties (text fields, sizes, placement) keyed by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub layout: BTreeMap<String, Value>,
    /// Optional feature filter expression in engine syntax.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
}

impl StyleRule {
    /// Creates an empty style rule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a paint property, replacing any previous value for the key.
    pub fn with_paint(mut self, key: impl Into<String>, value: Value) -> Self {
        self.paint.insert(key.into(), value);
        self
    }

    /// Adds a layout property, replacing any previous value for the key.
    pub fn with_layout(mut self, key: impl Into<String>, value: Value) -> Self {
        self.layout.insert(key.into(), value);
        self
    }

    /// Sets the feature filter expression.
    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Complete declarative description of one map layer.
///
/// A descriptor is a value, not a handle: building one has no effect on any
/// renderer. The reconciliation engine compares descriptors against applied
/// state and issues the minimal mutations to make the renderer agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    /// Stable identity for this layer.
    pub id: LayerId,
    /// Rendering primitive; fixed for the lifetime of the mounted layer.
    pub kind: LayerKind,
    /// Whether the layer should be shown at all.
    pub visible: bool,
    /// Effective opacity in `[0.0, 1.0]`. A value of `0.0` keeps the layer
    /// mounted but fully transparent, which is cheaper to toggle than a
    /// remove-and-remount cycle.
    pub opacity: f64,
    /// Paint, layout, and filter properties.
    #[serde(default)]
    pub style: StyleRule,
    /// The source this layer reads features from.
    pub source: SourceId,
    /// Layer within a vector source, where the source distinguishes them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_layer: Option<String>,
    /// Relative depth hint. Layers with a higher hint are painted first and
    /// end up further back; equal hints keep their relative order.
    #[serde(default)]
    pub z_order_hint: i32,
}

impl LayerDescriptor {
    /// Creates a visible, fully opaque descriptor with an empty style.
    pub fn new(id: impl Into<LayerId>, kind: LayerKind, source: impl Into<SourceId>) -> Self {
        Self {
            id: id.into(),
            kind,
            visible: true,
            opacity: 1.0,
            style: StyleRule::new(),
            source: source.into(),
            source_layer: None,
            z_order_hint: 0,
        }
    }

    /// Sets visibility.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Sets opacity, clamped to `[0.0, 1.0]`.
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Sets the style rule.
    pub fn with_style(mut self, style: StyleRule) -> Self {
        self.style = style;
        self
    }

    /// Sets the source layer name for vector sources.
    pub fn with_source_layer(mut self, source_layer: impl Into<String>) -> Self {
        self.source_layer = Some(source_layer.into());
        self
    }

    /// Sets the depth hint.
    pub fn with_z_order_hint(mut self, hint: i32) -> Self {
        self.z_order_hint = hint;
        self
    }
}

/// Computes the opacity a layer inherits from its group.
///
/// A hidden group forces its members fully transparent regardless of the
/// group's configured opacity; a shown group passes its opacity through
/// unchanged. Membership in the rendered set is unaffected either way, so
/// toggling visibility is a repaint rather than a teardown.
///
/// # Example
///
/// ```ignore
/// assert_eq!(derive_opacity(true, 0.8), 0.8);
/// assert_eq!(derive_opacity(false, 0.8), 0.0);
/// ```
pub fn derive_opacity(group_visible: bool, group_opacity: f64) -> f64 {
    if group_visible {
        group_opacity.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_layer_id_display_and_debug() {
        let id = LayerId::new("pd-healthcare");
        assert_eq!(id.as_str(), "pd-healthcare");
        assert_eq!(format!("{}", id), "pd-healthcare");
        assert_eq!(format!("{:?}", id), "LayerId(pd-healthcare)");
    }

    #[test]
    fn test_layer_id_equality() {
        assert_eq!(LayerId::new("a"), LayerId::from("a"));
        assert_ne!(LayerId::new("a"), LayerId::new("b"));
    }

    #[test]
    fn test_opacity_property_per_kind() {
        assert_eq!(LayerKind::Fill.opacity_property(), "fill-opacity");
        assert_eq!(LayerKind::Line.opacity_property(), "line-opacity");
        assert_eq!(LayerKind::Circle.opacity_property(), "circle-opacity");
        assert_eq!(LayerKind::Symbol.opacity_property(), "text-opacity");
        assert_eq!(
            LayerKind::Extrusion.opacity_property(),
            "fill-extrusion-opacity"
        );
        assert_eq!(LayerKind::Raster.opacity_property(), "raster-opacity");
    }

    #[test]
    fn test_style_rule_builder() {
        let rule = StyleRule::new()
            .with_paint("circle-color", json!("#EF4444"))
            .with_paint("circle-radius", json!(4))
            .with_layout("visibility", json!("visible"))
            .with_filter(json!(["==", ["get", "class"], "hospital"]));

        assert_eq!(rule.paint.len(), 2);
        assert_eq!(rule.layout.len(), 1);
        assert!(rule.filter.is_some());
    }

    #[test]
    fn test_style_rule_equality_is_order_independent() {
        let a = StyleRule::new()
            .with_paint("line-color", json!("#06b6d4"))
            .with_paint("line-width", json!(2));
        let b = StyleRule::new()
            .with_paint("line-width", json!(2))
            .with_paint("line-color", json!("#06b6d4"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_descriptor_builder_defaults() {
        let layer = LayerDescriptor::new("pd-education", LayerKind::Circle, "streets");
        assert!(layer.visible);
        assert_eq!(layer.opacity, 1.0);
        assert_eq!(layer.z_order_hint, 0);
        assert!(layer.source_layer.is_none());
    }

    #[test]
    fn test_descriptor_opacity_clamped() {
        let layer =
            LayerDescriptor::new("a", LayerKind::Fill, "s").with_opacity(1.5);
        assert_eq!(layer.opacity, 1.0);
        let layer =
            LayerDescriptor::new("a", LayerKind::Fill, "s").with_opacity(-0.2);
        assert_eq!(layer.opacity, 0.0);
    }

    #[test]
    fn test_derive_opacity_visible_passes_through() {
        assert_eq!(derive_opacity(true, 0.8), 0.8);
        assert_eq!(derive_opacity(true, 0.0), 0.0);
    }

    #[test]
    fn test_derive_opacity_hidden_forces_zero() {
        assert_eq!(derive_opacity(false, 0.8), 0.0);
        assert_eq!(derive_opacity(false, 1.0), 0.0);
    }

    #[test]
    fn test_derive_opacity_clamps_out_of_range() {
        assert_eq!(derive_opacity(true, 2.0), 1.0);
        assert_eq!(derive_opacity(true, -1.0), 0.0);
    }

    #[test]
    fn test_descriptor_serde_round_trip() {
        let layer = LayerDescriptor::new("pd-transport-roads", LayerKind::Line, "streets")
            .with_source_layer("road")
            .with_z_order_hint(10)
            .with_opacity(0.8)
            .with_style(
                StyleRule::new()
                    .with_paint("line-color", json!("#06b6d4"))
                    .with_filter(json!(["==", ["get", "class"], "major"])),
            );
        let encoded = serde_json::to_string(&layer).unwrap();
        let decoded: LayerDescriptor = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, layer);
    }
}
