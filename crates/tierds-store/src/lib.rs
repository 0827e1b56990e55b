//! Local key/value datastores for tierds.
//!
//! Every backend implements the [`Datastore`] trait, which is also the
//! contract exposed by the tiered resolver built on top of these stores.
//!
//! # Storage Backends
//!
//! - [`FlatfsDatastore`] -- one file per value, sharded into directories by a
//!   [`ShardFunction`]
//! - [`InMemoryDatastore`] -- map-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Every call takes a [`Context`](tierds_types::Context) and stops with
//!    [`StoreError::Interrupted`] once it is cancelled or past its deadline.
//! 2. A missing key is [`StoreError::NotFound`]; `has` reports it as `false`.
//! 3. Concurrent reads are always safe.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod flatfs;
pub mod memory;
pub mod shard;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use flatfs::FlatfsDatastore;
pub use memory::InMemoryDatastore;
pub use shard::ShardFunction;
pub use traits::Datastore;
