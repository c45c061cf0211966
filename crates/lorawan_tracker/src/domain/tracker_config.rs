use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_MANIFEST_PATH: &str = "/etc/waggle/node-manifest-v2.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Identifier of this node, used as the connection's `node`
    pub node_vsn: String,

    /// Path of the node manifest file
    pub manifest_path: PathBuf,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            node_vsn: String::new(),
            manifest_path: PathBuf::from(DEFAULT_MANIFEST_PATH),
        }
    }
}
