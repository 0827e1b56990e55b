use cid::Cid;
use serde::{Deserialize, Serialize};

use crate::codec::Codec;
use crate::convert::key_to_multihash;
use crate::error::TypeError;
use crate::key::DatastoreKey;

/// Ordered list of codecs tried when deriving CIDs from a block key.
///
/// The order is a priority: earlier codecs are tried first. The list is never
/// empty and never repeats a codec. The default is `[raw, dag-pb]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Codec>", into = "Vec<Codec>")]
pub struct CodecCandidates {
    codecs: Vec<Codec>,
}

impl CodecCandidates {
    /// Validate and wrap an ordered codec list.
    pub fn new(codecs: Vec<Codec>) -> Result<Self, TypeError> {
        if codecs.is_empty() {
            return Err(TypeError::EmptyCandidates);
        }
        for (i, codec) in codecs.iter().enumerate() {
            if codecs[..i].contains(codec) {
                return Err(TypeError::DuplicateCodec(*codec));
            }
        }
        Ok(Self { codecs })
    }

    /// Parse an ordered list of codec names.
    pub fn from_names<I, S>(names: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codecs = names
            .into_iter()
            .map(|name| Codec::from_name(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(codecs)
    }

    /// The codecs in priority order.
    pub fn codecs(&self) -> &[Codec] {
        &self.codecs
    }

    /// Number of candidate codecs.
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Returns `true` if there are no candidate codecs.
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// The CIDs `key` may stand for, in priority order.
    ///
    /// Fails with [`TypeError::MalformedKey`] when the key does not name a
    /// multihash; in that case no codec can produce a usable CID.
    pub fn candidates(&self, key: &DatastoreKey) -> Result<Vec<Cid>, TypeError> {
        let hash = key_to_multihash(key)?;
        Ok(self
            .codecs
            .iter()
            .map(|codec| Cid::new_v1(codec.code(), hash))
            .collect())
    }
}

impl Default for CodecCandidates {
    fn default() -> Self {
        Self {
            codecs: vec![Codec::RAW, Codec::DAG_PROTOBUF],
        }
    }
}

impl TryFrom<Vec<Codec>> for CodecCandidates {
    type Error = TypeError;

    fn try_from(codecs: Vec<Codec>) -> Result<Self, Self::Error> {
        Self::new(codecs)
    }
}

impl From<CodecCandidates> for Vec<Codec> {
    fn from(candidates: CodecCandidates) -> Self {
        candidates.codecs
    }
}
