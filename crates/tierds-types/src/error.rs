use thiserror::Error;

use crate::codec::Codec;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("malformed key {key}: {reason}")]
    MalformedKey { key: String, reason: String },

    #[error("unknown codec: {0}")]
    UnknownCodec(String),

    #[error("codec candidate list is empty")]
    EmptyCandidates,

    #[error("duplicate codec in candidate list: {0}")]
    DuplicateCodec(Codec),
}

/// Why a [`Context`](crate::Context) stopped an operation.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum Interrupted {
    #[error("context cancelled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}
