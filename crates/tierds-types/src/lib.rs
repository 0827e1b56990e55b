//! Foundation types for tierds.
//!
//! This crate provides the addressing and request types shared by every other
//! tierds crate.
//!
//! # Key Types
//!
//! - [`DatastoreKey`] -- Cleaned, hierarchical key used by local datastores
//! - [`Codec`] -- Multicodec tag embedded in a content identifier
//! - [`CodecCandidates`] -- Ordered codec list used to derive CIDs from a key
//! - [`Context`] -- Cancellation and deadline carried by every store call
//!
//! Keys and CIDs live in different address spaces. A block key names only the
//! multihash, so the conversion functions in [`convert`] need a codec to build
//! a CID, and drop it again when going the other way.

pub mod block;
pub mod candidates;
pub mod codec;
pub mod context;
pub mod convert;
pub mod error;
pub mod key;

pub use block::{block_cid, sha256_multihash, SHA2_256};
pub use candidates::CodecCandidates;
pub use cid::Cid;
pub use codec::Codec;
pub use context::Context;
pub use convert::{cid_to_key, key_to_cid, key_to_multihash, multihash_to_key, Multihash};
pub use error::{Interrupted, TypeError};
pub use key::DatastoreKey;
