mod client;
mod config;
mod conversions;
mod proto;

pub use client::*;
pub use config::*;
