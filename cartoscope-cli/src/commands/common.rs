//! Shared argument types for catalog-driven commands.

use clap::{Args, ValueEnum};

use cartoscope::renderer::EngineKind;
use cartoscope::store::{MasterPlanState, MasterPlanSublayers, PresentDayLayers, StoreSnapshot};

/// Rendering engine selector.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum EngineChoice {
    /// Mapbox GL: resolves mapbox:// tilesets natively
    Mapbox,
    /// MapLibre GL: mapbox:// tilesets are rewritten to the tile API
    Maplibre,
}

impl From<EngineChoice> for EngineKind {
    fn from(choice: EngineChoice) -> Self {
        match choice {
            EngineChoice::Mapbox => EngineKind::Mapbox,
            EngineChoice::Maplibre => EngineKind::MapLibre,
        }
    }
}

/// Map-state toggles mirrored from the interactive UI.
///
/// Defaults match a fresh session: 3D buildings and the master plan group
/// on, everything else off.
#[derive(Debug, Args)]
pub struct StateFlags {
    /// Show the healthcare facilities layer
    #[arg(long)]
    pub healthcare: bool,

    /// Show the education facilities layer
    #[arg(long)]
    pub education: bool,

    /// Show the transport stops and major roads layers
    #[arg(long)]
    pub transport: bool,

    /// Show the commercial locations layer
    #[arg(long)]
    pub commercial: bool,

    /// Hide the 3D city buildings layer
    #[arg(long)]
    pub no_buildings: bool,

    /// Show terrain contour lines
    #[arg(long)]
    pub terrain: bool,

    /// Hide the whole master plan overlay group
    #[arg(long)]
    pub no_master_plan: bool,

    /// Master plan overlay opacity, 0.0 to 1.0
    #[arg(long, default_value_t = 0.8)]
    pub master_plan_opacity: f64,

    /// Hide the metro stations overlay
    #[arg(long)]
    pub no_metro_stations: bool,

    /// Hide the LRTS alignment overlay
    #[arg(long)]
    pub no_lrts_alignment: bool,

    /// Hide the land use zones overlay
    #[arg(long)]
    pub no_land_use_zones: bool,
}

impl StateFlags {
    /// Builds the store snapshot these flags describe.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            present_day: PresentDayLayers {
                healthcare: self.healthcare,
                education: self.education,
                transport: self.transport,
                commercial: self.commercial,
                buildings_3d: !self.no_buildings,
                terrain_3d: self.terrain,
            },
            master_plan: MasterPlanState {
                visible: !self.no_master_plan,
                sublayers: MasterPlanSublayers {
                    metro_stations: !self.no_metro_stations,
                    lrts_alignment: !self.no_lrts_alignment,
                    land_use_zones: !self.no_land_use_zones,
                },
                opacity: self.master_plan_opacity.clamp(0.0, 1.0),
            },
            ..StoreSnapshot::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_flags() -> StateFlags {
        StateFlags {
            healthcare: false,
            education: false,
            transport: false,
            commercial: false,
            no_buildings: false,
            terrain: false,
            no_master_plan: false,
            master_plan_opacity: 0.8,
            no_metro_stations: false,
            no_lrts_alignment: false,
            no_land_use_zones: false,
        }
    }

    #[test]
    fn test_no_flags_means_fresh_session_state() {
        assert_eq!(default_flags().snapshot(), StoreSnapshot::default());
    }

    #[test]
    fn test_flags_map_onto_snapshot() {
        let mut flags = default_flags();
        flags.healthcare = true;
        flags.no_buildings = true;
        flags.no_master_plan = true;
        flags.master_plan_opacity = 1.5;

        let snapshot = flags.snapshot();
        assert!(snapshot.present_day.healthcare);
        assert!(!snapshot.present_day.buildings_3d);
        assert!(!snapshot.master_plan.visible);
        assert_eq!(snapshot.master_plan.opacity, 1.0);
    }

    #[test]
    fn test_engine_choice_maps_to_kind() {
        assert_eq!(EngineKind::from(EngineChoice::Mapbox), EngineKind::Mapbox);
        assert_eq!(
            EngineKind::from(EngineChoice::Maplibre),
            EngineKind::MapLibre
        );
    }
}
