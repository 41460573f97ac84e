//! The injectable state container.

use std::sync::Arc;

use geojson::Feature;
use tokio::sync::watch;
use tracing::debug;

use crate::draw::DrawMode;

use super::{
    MasterPlanOverlay, PresentDayLayer, StoreSnapshot, SystemHealth, ViewState,
};

/// Central state container for one map session.
///
/// All mutation goes through the action methods below; every consumer
/// observes the same state through [`subscribe`](Self::subscribe), a
/// publish-latest channel. A receiver that falls behind sees only the newest
/// snapshot, which is what lets rapid toggle storms coalesce into a single
/// reconciliation pass downstream.
///
/// Clones share the same underlying state.
///
/// # Example
///
/// ```ignore
/// let store = MapStore::new();
/// let mut updates = store.subscribe();
///
/// store.toggle_present_day(PresentDayLayer::Healthcare);
/// updates.changed().await?;
/// assert!(updates.borrow().present_day.healthcare);
/// ```
#[derive(Clone)]
pub struct MapStore {
    state: Arc<watch::Sender<StoreSnapshot>>,
}

impl Default for MapStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MapStore {
    /// Creates a store with default state.
    pub fn new() -> Self {
        Self::with_snapshot(StoreSnapshot::default())
    }

    /// Creates a store seeded with the given snapshot.
    pub fn with_snapshot(snapshot: StoreSnapshot) -> Self {
        let (tx, _) = watch::channel(snapshot);
        Self {
            state: Arc::new(tx),
        }
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.borrow().clone()
    }

    /// Subscribes to state changes. The receiver always starts with the
    /// current snapshot marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.state.subscribe()
    }

    /// Flips one present-day layer toggle.
    pub fn toggle_present_day(&self, layer: PresentDayLayer) {
        self.update(|state| {
            state.present_day.toggle(layer);
            debug!(
                layer = ?layer,
                enabled = state.present_day.is_enabled(layer),
                "present-day toggle"
            );
            true
        });
    }

    /// Shows or hides the whole master-plan group.
    pub fn set_master_plan_visible(&self, visible: bool) {
        self.update(|state| {
            if state.master_plan.visible == visible {
                return false;
            }
            state.master_plan.visible = visible;
            true
        });
    }

    /// Flips one overlay toggle inside the master-plan group.
    pub fn toggle_master_plan_overlay(&self, overlay: MasterPlanOverlay) {
        self.update(|state| {
            let sublayers = &mut state.master_plan.sublayers;
            let flag = match overlay {
                MasterPlanOverlay::MetroStations => &mut sublayers.metro_stations,
                MasterPlanOverlay::LrtsAlignment => &mut sublayers.lrts_alignment,
                MasterPlanOverlay::LandUseZones => &mut sublayers.land_use_zones,
            };
            *flag = !*flag;
            true
        });
    }

    /// Sets the master-plan group opacity, clamped to `[0.0, 1.0]`.
    pub fn set_master_plan_opacity(&self, opacity: f64) {
        self.update(|state| {
            let clamped = opacity.clamp(0.0, 1.0);
            if state.master_plan.opacity == clamped {
                return false;
            }
            state.master_plan.opacity = clamped;
            true
        });
    }

    /// Replaces the camera position.
    pub fn set_view(&self, view: ViewState) {
        self.update(|state| {
            if state.view == view {
                return false;
            }
            state.view = view;
            true
        });
    }

    /// Records the drawing tool's active mode.
    pub fn set_draw_mode(&self, mode: DrawMode) {
        self.update(|state| {
            if state.draw_mode == mode {
                return false;
            }
            debug!(mode = %mode, "draw mode change");
            state.draw_mode = mode;
            true
        });
    }

    /// Replaces the selected parcel feature, or clears it.
    pub fn set_selected_parcel(&self, parcel: Option<Feature>) {
        self.update(|state| {
            if state.selected_parcel == parcel {
                return false;
            }
            state.selected_parcel = parcel;
            true
        });
    }

    /// Replaces the health indicator state.
    pub fn set_health(&self, health: SystemHealth) {
        self.update(|state| {
            if state.health == health {
                return false;
            }
            debug!(status = %health.status, message = %health.message, "health change");
            state.health = health;
            true
        });
    }

    /// Applies a mutation, notifying subscribers only when the closure
    /// reports an actual change.
    fn update(&self, mutate: impl FnOnce(&mut StoreSnapshot) -> bool) {
        self.state.send_if_modified(mutate);
    }
}
