//! Events emitted by the embedding draw tool.

/// One draw-tool event, carrying the finished geometry where one exists.
///
/// The tool fires `Create` when a gesture completes, `Update` when an
/// existing shape's vertices are edited, and `Delete` when the shape is
/// removed.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawEvent {
    Create(geojson::Geometry),
    Update(geojson::Geometry),
    Delete,
}

impl DrawEvent {
    /// The geometry carried by this event, if any.
    pub fn geometry(&self) -> Option<&geojson::Geometry> {
        match self {
            Self::Create(geometry) | Self::Update(geometry) => Some(geometry),
            Self::Delete => None,
        }
    }
}
