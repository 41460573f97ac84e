//! The draw-interaction state machine.
//!
//! External draw-tool events (`create`, `update`, `delete`) flow through a
//! pure [`DrawTracker`] that maintains the active mode and the single
//! [`DrawnRegion`], and a [`DrawRouter`] that turns tracker outcomes into
//! work: sector analysis for polygons, elevation profiles for lines, and
//! cleared results for everything else.

mod events;
mod mode;
mod region;
mod router;
mod tracker;

pub use events::DrawEvent;
pub use mode::DrawMode;
pub use region::DrawnRegion;
pub use router::DrawRouter;
pub use tracker::{DrawOutcome, DrawTracker};
