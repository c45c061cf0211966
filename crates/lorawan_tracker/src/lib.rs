pub mod domain;
mod lorawan_tracker;
pub mod mqtt;

pub use lorawan_tracker::*;
