use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tierds_remote::RemoteError;
use tierds_types::Cid;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid CID {cid:?}: {reason}")]
    InvalidCid { cid: String, reason: String },

    #[error("block not found: {0}")]
    BlockNotFound(Cid),

    #[error("block store error: {0}")]
    Remote(RemoteError),

    #[error("store error: {0}")]
    Store(#[from] tierds_store::StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RemoteError> for ServerError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::NotFound(cid) => Self::BlockNotFound(cid),
            other => Self::Remote(other),
        }
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCid { .. } => StatusCode::BAD_REQUEST,
            Self::BlockNotFound(_) => StatusCode::NOT_FOUND,
            Self::Remote(RemoteError::Interrupted(_)) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
        }
        (status, self.to_string()).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
