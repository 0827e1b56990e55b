use cid::Cid;
use sha2::{Digest, Sha256};

use crate::codec::Codec;
use crate::convert::Multihash;

/// Multihash code for SHA2-256.
pub const SHA2_256: u64 = 0x12;

/// SHA2-256 multihash of `data`.
pub fn sha256_multihash(data: &[u8]) -> Multihash {
    let digest = Sha256::digest(data);
    Multihash::wrap(SHA2_256, &digest).expect("32-byte digest fits in a 64-byte multihash")
}

/// Version 1 CID for `data` under `codec`, hashed with SHA2-256.
pub fn block_cid(codec: Codec, data: &[u8]) -> Cid {
    Cid::new_v1(codec.code(), sha256_multihash(data))
}
