//! Risk visualization engine for facility risk maps.
//!
//! Takes a snapshot of scored locations and derives what a map view needs:
//! risk levels and colors, marker layouts, the filtered/searched subset,
//! facility statistics, and the selection/navigation state machine.

pub mod braille;
pub mod data;
pub mod filter;
pub mod hash;
pub mod map;
pub mod risk;
pub mod stats;
pub mod view;

pub use data::{Alert, AlertStatus, Location, LocationId, SnapshotError};
pub use filter::LevelFilter;
pub use map::LayoutMode;
pub use risk::{classify, RiskLevel};
pub use stats::Statistics;
pub use view::{NavDirection, RiskMapView, ViewConfig, ViewEvent, ViewState};
