//! Injectable map state container.
//!
//! One [`MapStore`] holds everything the UI surface reads: layer toggles,
//! the master-plan group, camera position, draw mode, selected parcel, and
//! the health indicator. State flows one way: actions mutate the store, the
//! store publishes [`StoreSnapshot`]s over a watch channel, and the session
//! derives descriptors from whatever snapshot is newest. Burst updates
//! coalesce; consumers only ever materialize the latest state.

mod map_store;
mod state;

pub use map_store::MapStore;
pub use state::{
    HealthStatus, MasterPlanOverlay, MasterPlanState, MasterPlanSublayers, PresentDayLayer,
    PresentDayLayers, StoreSnapshot, SystemHealth, ViewState,
};
