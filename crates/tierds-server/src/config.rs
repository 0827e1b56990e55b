use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tierds_store::{ShardFunction, StoreResult};

/// Default block server port.
pub const DEFAULT_PORT: u16 = 5080;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Flatfs directory holding the served blocks.
    pub store_path: PathBuf,
    pub shard_func: String,
    pub sync: bool,
}

impl ServerConfig {
    pub fn shard(&self) -> StoreResult<ShardFunction> {
        ShardFunction::parse(&self.shard_func)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            store_path: PathBuf::from("blocks"),
            shard_func: ShardFunction::default().to_string(),
            sync: true,
        }
    }
}
