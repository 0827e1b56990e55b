//! Tiered datastore: remote block store first, local flatfs second.
//!
//! [`TieredDatastore`] implements the ordinary [`Datastore`](tierds_store::Datastore)
//! contract. Reads translate the key into one CID per configured codec and
//! try each against the remote tier before asking the local store; writes
//! only ever touch the local store. [`DatastoreConfig`] builds one from the
//! same parameters a flatfs datastore would take, plus a remote `endpoint`.

pub mod config;
pub mod error;
pub mod metrics;
pub mod resolver;

pub use config::{DatastoreConfig, DiskSpec, HttpTieredDatastore, DATASTORE_TYPE};
pub use error::{ConfigError, ConfigResult, Tier};
pub use metrics::{MetricsSnapshot, ResolverMetrics};
pub use resolver::TieredDatastore;
