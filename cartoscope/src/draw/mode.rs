//! Drawing tool modes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The active mode of the external drawing tool.
///
/// Mode names mirror the draw tool's own identifiers, which is what the
/// serde representation preserves. Only [`SimpleSelect`](Self::SimpleSelect)
/// is idle; the other three arm the tool to produce one shape of the named
/// kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    /// Idle: existing shapes can be selected and dragged.
    #[default]
    SimpleSelect,
    /// Next click places a point.
    DrawPoint,
    /// Clicks extend a line; double-click finishes it.
    DrawLineString,
    /// Clicks extend a polygon ring; double-click closes it.
    DrawPolygon,
}

impl DrawMode {
    /// The draw tool's identifier for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawMode::SimpleSelect => "simple_select",
            DrawMode::DrawPoint => "draw_point",
            DrawMode::DrawLineString => "draw_line_string",
            DrawMode::DrawPolygon => "draw_polygon",
        }
    }

    /// True for every mode except the idle select mode.
    pub fn is_drawing(&self) -> bool {
        !matches!(self, DrawMode::SimpleSelect)
    }
}

impl fmt::Display for DrawMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        assert_eq!(DrawMode::default(), DrawMode::SimpleSelect);
        assert!(!DrawMode::default().is_drawing());
    }

    #[test]
    fn test_tool_identifiers() {
        assert_eq!(DrawMode::SimpleSelect.as_str(), "simple_select");
        assert_eq!(DrawMode::DrawPolygon.as_str(), "draw_polygon");
        assert_eq!(DrawMode::DrawLineString.as_str(), "draw_line_string");
        assert_eq!(DrawMode::DrawPoint.as_str(), "draw_point");
    }

    #[test]
    fn test_serde_uses_tool_identifiers() {
        let encoded = serde_json::to_string(&DrawMode::DrawLineString).unwrap();
        assert_eq!(encoded, "\"draw_line_string\"");
        let decoded: DrawMode = serde_json::from_str("\"simple_select\"").unwrap();
        assert_eq!(decoded, DrawMode::SimpleSelect);
    }
}
