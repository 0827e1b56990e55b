use thiserror::Error;
use tierds_types::{Cid, Interrupted};

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("block not found: {0}")]
    NotFound(Cid),

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("unexpected status {status} for block {cid}")]
    UnexpectedStatus { cid: Cid, status: u16 },

    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("backend error: {0}")]
    Backend(String),

    #[error("interrupted: {0}")]
    Interrupted(#[from] Interrupted),
}

impl RemoteError {
    /// Returns `true` for a clean miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// The interruption reason, if the caller's context ended the call.
    pub fn interrupted(&self) -> Option<Interrupted> {
        match self {
            Self::Interrupted(reason) => Some(*reason),
            _ => None,
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;
