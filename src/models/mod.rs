pub mod bay;
pub mod clocked_time;
pub mod status;

pub use bay::{Bay, BayId, DisplayBay};
pub use clocked_time::ClockedTime;
pub use status::StatusTier;
