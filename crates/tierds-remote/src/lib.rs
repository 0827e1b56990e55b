//! Remote block stores for tierds.
//!
//! A remote tier is addressed by CID, not by datastore key. Implementations
//! of [`BlockStore`] report a clean miss as [`RemoteError::NotFound`] and
//! anything else that went wrong as another [`RemoteError`] variant, so a
//! caller can tell the two apart if it wants to.

pub mod adapter;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod memory;
pub mod traits;

pub use adapter::DatastoreBlockStore;
pub use endpoint::{endpoints, HealthResponse, BLOCK_SIZE_HEADER};
pub use error::{RemoteError, RemoteResult};
pub use http::{HttpBlockStore, DEFAULT_REQUEST_TIMEOUT};
pub use memory::InMemoryBlockStore;
pub use traits::BlockStore;
