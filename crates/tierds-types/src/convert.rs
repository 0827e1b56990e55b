//! Conversions between datastore keys, multihashes and CIDs.
//!
//! A block key is `/` followed by the unpadded, upper-case RFC 4648 base32
//! encoding of the block's multihash bytes. The codec is not part of the key.

use cid::Cid;
use multibase::Base;

use crate::codec::Codec;
use crate::error::TypeError;
use crate::key::DatastoreKey;

/// Multihash with room for digests up to 64 bytes.
pub type Multihash = multihash::Multihash<64>;

/// Encode a multihash as a block key.
pub fn multihash_to_key(hash: &Multihash) -> DatastoreKey {
    DatastoreKey::new(Base::Base32Upper.encode(hash.to_bytes()))
}

/// The block key for a CID. The codec is dropped.
pub fn cid_to_key(cid: &Cid) -> DatastoreKey {
    multihash_to_key(cid.hash())
}

/// Decode the multihash named by a block key.
pub fn key_to_multihash(key: &DatastoreKey) -> Result<Multihash, TypeError> {
    let encoded = &key.as_str()[1..];
    if encoded.is_empty() {
        return Err(malformed(key, "empty key"));
    }
    let bytes = Base::Base32Upper
        .decode(encoded)
        .map_err(|e| malformed(key, e))?;
    Multihash::from_bytes(&bytes).map_err(|e| malformed(key, e))
}

/// Build the version 1 CID a block key stands for under `codec`.
pub fn key_to_cid(key: &DatastoreKey, codec: Codec) -> Result<Cid, TypeError> {
    let hash = key_to_multihash(key)?;
    Ok(Cid::new_v1(codec.code(), hash))
}

fn malformed(key: &DatastoreKey, reason: impl std::fmt::Display) -> TypeError {
    TypeError::MalformedKey {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
