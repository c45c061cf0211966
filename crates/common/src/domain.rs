mod backend;
mod connection_type;
mod network_server;
mod result;
mod uplink;

pub use backend::*;
pub use connection_type::*;
pub use network_server::*;
pub use result::*;
pub use uplink::*;
