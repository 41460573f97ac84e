//! Pure state machine for the draw interaction.

use geo_types::{LineString, Polygon};
use tracing::debug;

use super::events::DrawEvent;
use super::mode::DrawMode;
use super::region::DrawnRegion;

/// What an applied draw event asks the rest of the system to do.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutcome {
    /// A polygon was finished; run sector analysis on it.
    Analyze(Polygon<f64>),
    /// A line was finished; fetch its elevation profile.
    Profile(LineString<f64>),
    /// The region is gone; clear every published result.
    Cleared,
}

/// Tracks the active draw mode and the single drawn region.
///
/// The tracker is deliberately pure: it owns no channels and performs no
/// IO, it only folds draw-tool events into state and names the follow-up
/// work. Mode changes on their own never produce work.
#[derive(Debug, Default)]
pub struct DrawTracker {
    mode: DrawMode,
    region: Option<DrawnRegion>,
}

impl DrawTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently active tool mode.
    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    /// The current region, if one is drawn.
    pub fn region(&self) -> Option<&DrawnRegion> {
        self.region.as_ref()
    }

    /// Records a tool mode change. Triggers nothing by itself.
    pub fn set_mode(&mut self, mode: DrawMode) {
        if self.mode != mode {
            debug!(mode = %mode, "draw mode changed");
            self.mode = mode;
        }
    }

    /// Folds one draw-tool event into the tracker.
    ///
    /// `Create` and `Update` replace the current region with the event's
    /// geometry; a geometry the analysis pipeline cannot use (a point, for
    /// instance) still replaces the region, leaving none. Finishing a
    /// gesture drops the tool back into select mode.
    pub fn apply(&mut self, event: DrawEvent) -> DrawOutcome {
        match event {
            DrawEvent::Create(geometry) => {
                // The tool leaves its drawing mode once the gesture ends.
                self.mode = DrawMode::SimpleSelect;
                self.replace_region(&geometry)
            }
            DrawEvent::Update(geometry) => self.replace_region(&geometry),
            DrawEvent::Delete => {
                self.region = None;
                DrawOutcome::Cleared
            }
        }
    }

    fn replace_region(&mut self, geometry: &geojson::Geometry) -> DrawOutcome {
        self.region = DrawnRegion::from_geometry(geometry);
        match &self.region {
            Some(DrawnRegion::Polygon(polygon)) => DrawOutcome::Analyze(polygon.clone()),
            Some(DrawnRegion::Line(line)) => DrawOutcome::Profile(line.clone()),
            None => DrawOutcome::Cleared,
        }
    }
}
