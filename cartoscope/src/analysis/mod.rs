//! Region analysis: derived metrics for a user-drawn sector.
//!
//! Given a drawn polygon and the session's reference datasets, the engine
//! reports the sector's area, the zoning districts it touches, and the
//! amenities it contains. The contract is deliberately forgiving: a missing
//! region yields the zero-value report, and malformed reference features are
//! skipped one by one rather than failing the whole computation.

mod engine;
mod report;

pub use engine::{analyze_selection, calculate_area, AreaBreakdown};
pub use report::{SectorAnalysis, MAX_LISTED_AMENITIES, MAX_LISTED_ZONES};
