//! HTTP block server for tierds.
//!
//! Serves any [`BlockStore`](tierds_remote::BlockStore) over the block API
//! consumed by [`HttpBlockStore`](tierds_remote::HttpBlockStore):
//!
//! - `GET /v1/block/{cid}` returns the block bytes, or 404.
//! - `HEAD /v1/block/{cid}` returns the size in `x-block-size`, or 404.
//! - `GET /v1/health` returns a [`HealthResponse`](tierds_remote::HealthResponse).

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::{ServerConfig, DEFAULT_PORT};
pub use error::{ServerError, ServerResult};
pub use router::build_router;
pub use server::BlockServer;
