//! Snapshot types for the map state container.

use std::fmt;

use geojson::Feature;
use serde::{Deserialize, Serialize};

use crate::descriptor::derive_opacity;
use crate::draw::DrawMode;

/// Visibility toggles for the present-day overlay group.
///
/// Each flag maps to one always-mounted layer; toggling changes the layer's
/// visibility in place, never its membership in the rendered set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentDayLayers {
    pub healthcare: bool,
    pub education: bool,
    pub transport: bool,
    pub commercial: bool,
    pub buildings_3d: bool,
    pub terrain_3d: bool,
}

impl Default for PresentDayLayers {
    fn default() -> Self {
        Self {
            healthcare: false,
            education: false,
            transport: false,
            commercial: false,
            buildings_3d: true,
            terrain_3d: false,
        }
    }
}

/// One toggleable layer in the present-day group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresentDayLayer {
    Healthcare,
    Education,
    Transport,
    Commercial,
    Buildings3d,
    Terrain3d,
}

impl PresentDayLayers {
    /// Flips the named toggle.
    pub fn toggle(&mut self, layer: PresentDayLayer) {
        let flag = self.flag_mut(layer);
        *flag = !*flag;
    }

    /// Reads the named toggle.
    pub fn is_enabled(&self, layer: PresentDayLayer) -> bool {
        match layer {
            PresentDayLayer::Healthcare => self.healthcare,
            PresentDayLayer::Education => self.education,
            PresentDayLayer::Transport => self.transport,
            PresentDayLayer::Commercial => self.commercial,
            PresentDayLayer::Buildings3d => self.buildings_3d,
            PresentDayLayer::Terrain3d => self.terrain_3d,
        }
    }

    fn flag_mut(&mut self, layer: PresentDayLayer) -> &mut bool {
        match layer {
            PresentDayLayer::Healthcare => &mut self.healthcare,
            PresentDayLayer::Education => &mut self.education,
            PresentDayLayer::Transport => &mut self.transport,
            PresentDayLayer::Commercial => &mut self.commercial,
            PresentDayLayer::Buildings3d => &mut self.buildings_3d,
            PresentDayLayer::Terrain3d => &mut self.terrain_3d,
        }
    }
}

/// The named overlays inside the master-plan group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MasterPlanOverlay {
    MetroStations,
    LrtsAlignment,
    LandUseZones,
}

/// Per-overlay toggles inside the master-plan group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterPlanSublayers {
    pub metro_stations: bool,
    pub lrts_alignment: bool,
    pub land_use_zones: bool,
}

impl Default for MasterPlanSublayers {
    fn default() -> Self {
        Self {
            metro_stations: true,
            lrts_alignment: true,
            land_use_zones: true,
        }
    }
}

/// The hierarchical master-plan overlay group.
///
/// The group visibility gates all three overlays at once; each sublayer flag
/// gates its own overlay on top of that. The group opacity applies to every
/// member uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterPlanState {
    pub visible: bool,
    pub sublayers: MasterPlanSublayers,
    pub opacity: f64,
}

impl Default for MasterPlanState {
    fn default() -> Self {
        Self {
            visible: true,
            sublayers: MasterPlanSublayers::default(),
            opacity: 0.8,
        }
    }
}

impl MasterPlanState {
    /// The opacity overlay layers actually render with: the configured
    /// opacity while the group is shown, zero while it is hidden.
    pub fn effective_opacity(&self) -> f64 {
        derive_opacity(self.visible, self.opacity)
    }

    /// Whether the named overlay should be visible, combining the group
    /// toggle with its own sublayer toggle.
    pub fn overlay_visible(&self, overlay: MasterPlanOverlay) -> bool {
        let sublayer = match overlay {
            MasterPlanOverlay::MetroStations => self.sublayers.metro_stations,
            MasterPlanOverlay::LrtsAlignment => self.sublayers.lrts_alignment,
            MasterPlanOverlay::LandUseZones => self.sublayers.land_use_zones,
        };
        self.visible && sublayer
    }
}

/// Camera position over the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        // Thiruvananthapuram city center, the system's home view.
        Self {
            longitude: 76.9366,
            latitude: 8.5241,
            zoom: 11.0,
            pitch: 0.0,
            bearing: 0.0,
        }
    }
}

/// Coarse health classification for the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Failed,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Failed => "failed",
        };
        write!(f, "{label}")
    }
}

/// Status plus a human-readable message for the health indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemHealth {
    pub status: HealthStatus,
    pub message: String,
}

impl Default for SystemHealth {
    fn default() -> Self {
        Self::healthy()
    }
}

impl SystemHealth {
    /// The nominal all-clear state.
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: "System Operational".to_string(),
        }
    }

    /// A degraded-but-running state.
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Degraded,
            message: message.into(),
        }
    }

    /// A failed state, typically from a renderer lifecycle error.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Failed,
            message: message.into(),
        }
    }
}

/// One complete, immutable snapshot of the map's UI-facing state.
///
/// Snapshots are what the store publishes; consumers never see intermediate
/// mutation states. Cloning is cheap enough to do per update (the selected
/// parcel is the only non-`Copy` payload).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub present_day: PresentDayLayers,
    pub master_plan: MasterPlanState,
    pub view: ViewState,
    pub draw_mode: DrawMode,
    pub selected_parcel: Option<Feature>,
    pub health: SystemHealth,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_day_defaults() {
        let layers = PresentDayLayers::default();
        assert!(!layers.healthcare);
        assert!(!layers.education);
        assert!(!layers.transport);
        assert!(!layers.commercial);
        assert!(layers.buildings_3d);
        assert!(!layers.terrain_3d);
    }

    #[test]
    fn test_present_day_toggle_flips() {
        let mut layers = PresentDayLayers::default();
        layers.toggle(PresentDayLayer::Healthcare);
        assert!(layers.is_enabled(PresentDayLayer::Healthcare));
        layers.toggle(PresentDayLayer::Healthcare);
        assert!(!layers.is_enabled(PresentDayLayer::Healthcare));

        layers.toggle(PresentDayLayer::Buildings3d);
        assert!(!layers.buildings_3d);
    }

    #[test]
    fn test_master_plan_defaults() {
        let master_plan = MasterPlanState::default();
        assert!(master_plan.visible);
        assert!(master_plan.sublayers.metro_stations);
        assert!(master_plan.sublayers.lrts_alignment);
        assert!(master_plan.sublayers.land_use_zones);
        assert_eq!(master_plan.opacity, 0.8);
    }

    #[test]
    fn test_effective_opacity_follows_group_visibility() {
        let mut master_plan = MasterPlanState::default();
        assert_eq!(master_plan.effective_opacity(), 0.8);
        master_plan.visible = false;
        assert_eq!(master_plan.effective_opacity(), 0.0);
    }

    #[test]
    fn test_overlay_visible_combines_group_and_sublayer() {
        let mut master_plan = MasterPlanState::default();
        assert!(master_plan.overlay_visible(MasterPlanOverlay::MetroStations));

        master_plan.sublayers.metro_stations = false;
        assert!(!master_plan.overlay_visible(MasterPlanOverlay::MetroStations));
        assert!(master_plan.overlay_visible(MasterPlanOverlay::LrtsAlignment));

        master_plan.visible = false;
        assert!(!master_plan.overlay_visible(MasterPlanOverlay::LrtsAlignment));
    }

    #[test]
    fn test_default_view_is_home_city() {
        let view = ViewState::default();
        assert_eq!(view.longitude, 76.9366);
        assert_eq!(view.latitude, 8.5241);
        assert_eq!(view.zoom, 11.0);
        assert_eq!(view.pitch, 0.0);
        assert_eq!(view.bearing, 0.0);
    }

    #[test]
    fn test_default_health_is_operational() {
        let health = SystemHealth::default();
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.message, "System Operational");
    }

    #[test]
    fn test_snapshot_serde_round_trip() {
        let mut snapshot = StoreSnapshot::default();
        snapshot.present_day.healthcare = true;
        snapshot.master_plan.opacity = 0.5;
        snapshot.draw_mode = DrawMode::DrawPolygon;

        let encoded = serde_json::to_string(&snapshot).unwrap();
        let decoded: StoreSnapshot = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, snapshot);
    }
}
