mod manifest_record;
mod manifest_schema;
mod manifest_store;
pub mod transform;
mod tracker;
mod tracker_config;
mod uplink_handler;

pub use manifest_record::*;
pub use manifest_schema::*;
pub use manifest_store::*;
pub use tracker::*;
pub use tracker_config::*;
pub use uplink_handler::*;
