mod config;
mod rest_client;

pub use config::*;
pub use rest_client::*;
