pub mod calculator;
pub mod export;
pub mod store;
pub mod ticker;
