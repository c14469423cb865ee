pub mod stats;
pub mod status;
