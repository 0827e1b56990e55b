use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Json, Response};
use bytes::Bytes;
use tierds_remote::{BlockStore, HealthResponse, BLOCK_SIZE_HEADER};
use tierds_types::{Cid, Context};
use tracing::debug;

use crate::error::{ServerError, ServerResult};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BlockStore>,
}

fn parse_cid(raw: &str) -> ServerResult<Cid> {
    Cid::try_from(raw).map_err(|e| ServerError::InvalidCid {
        cid: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// `GET /v1/block/{cid}`: the block bytes.
pub async fn get_block(
    State(state): State<AppState>,
    Path(cid): Path<String>,
) -> ServerResult<Response> {
    let cid = parse_cid(&cid)?;
    let data = state.store.get(&Context::background(), &cid).await?;
    debug!(%cid, len = data.len(), "served block");
    Ok((
        [(CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"))],
        Bytes::from(data),
    )
        .into_response())
}

/// `HEAD /v1/block/{cid}`: the block size, without the body.
pub async fn head_block(
    State(state): State<AppState>,
    Path(cid): Path<String>,
) -> ServerResult<Response> {
    let cid = parse_cid(&cid)?;
    let size = state.store.get_size(&Context::background(), &cid).await?;
    let size = HeaderValue::from(size);
    Ok((
        [
            (HeaderName::from_static(BLOCK_SIZE_HEADER), size.clone()),
            (CONTENT_LENGTH, size),
        ],
        (),
    )
        .into_response())
}
