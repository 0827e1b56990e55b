use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, Response, StatusCode, Url};
use tierds_types::{Cid, Context};
use tracing::{debug, info};

use crate::endpoint::{endpoints, HealthResponse, BLOCK_SIZE_HEADER};
use crate::error::{RemoteError, RemoteResult};
use crate::traits::BlockStore;

/// Per-request timeout applied when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`BlockStore`] backed by the HTTP block API of a remote block server.
///
/// The client is created once and shared; `reqwest` pools connections, so
/// concurrent calls are cheap. Every request is additionally raced against the
/// caller's [`Context`].
#[derive(Clone, Debug)]
pub struct HttpBlockStore {
    base: Url,
    client: Client,
}

impl HttpBlockStore {
    /// Client for `endpoint` with the default request timeout.
    ///
    /// `endpoint` is a URL (`http://host:port/prefix`) or a bare `host:port`,
    /// which is treated as plain HTTP.
    pub fn new(endpoint: &str) -> RemoteResult<Self> {
        Self::with_timeout(endpoint, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Client for `endpoint` with an explicit per-request timeout.
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> RemoteResult<Self> {
        let base = parse_endpoint(endpoint)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;
        info!(endpoint = %base, "remote block store client ready");
        Ok(Self { base, client })
    }

    /// The normalised base URL.
    pub fn endpoint(&self) -> &Url {
        &self.base
    }

    /// Query the server's health endpoint.
    pub async fn health(&self, ctx: &Context) -> RemoteResult<HealthResponse> {
        let url = self.url(endpoints::HEALTH);
        ctx.run(async {
            let resp = self.client.get(&url).send().await.map_err(transport)?;
            if resp.status() != StatusCode::OK {
                return Err(RemoteError::TransportError(format!(
                    "health check returned {}",
                    resp.status()
                )));
            }
            let body = resp.bytes().await.map_err(transport)?;
            serde_json::from_slice::<HealthResponse>(&body).map_err(|e| RemoteError::TransportError(e.to_string()))
        })
        .await?
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base.as_str().trim_end_matches('/'), path)
    }

    fn block_url(&self, cid: &Cid) -> String {
        self.url(&format!("{}/{cid}", endpoints::BLOCK))
    }

    async fn head(&self, cid: &Cid) -> RemoteResult<Option<Response>> {
        let resp = self
            .client
            .head(self.block_url(cid))
            .send()
            .await
            .map_err(transport)?;
        match resp.status() {
            StatusCode::OK => Ok(Some(resp)),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(RemoteError::UnexpectedStatus {
                cid: *cid,
                status: status.as_u16(),
            }),
        }
    }
}

fn parse_endpoint(endpoint: &str) -> RemoteResult<Url> {
    let invalid = |reason: String| RemoteError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty endpoint".into()));
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    let url = Url::parse(&with_scheme).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".into()));
    }
    Ok(url)
}

fn transport(err: reqwest::Error) -> RemoteError {
    RemoteError::TransportError(err.to_string())
}

fn block_size(resp: &Response) -> Option<u64> {
    let headers = resp.headers();
    headers
        .get(BLOCK_SIZE_HEADER)
        .or_else(|| headers.get(CONTENT_LENGTH))
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

#[async_trait]
impl BlockStore for HttpBlockStore {
    async fn get(&self, ctx: &Context, cid: &Cid) -> RemoteResult<Vec<u8>> {
        let url = self.block_url(cid);
        ctx.run(async {
            let resp = self.client.get(&url).send().await.map_err(transport)?;
            match resp.status() {
                StatusCode::OK => {
                    let body = resp.bytes().await.map_err(transport)?;
                    debug!(%cid, len = body.len(), "remote block fetched");
                    Ok(body.to_vec())
                }
                StatusCode::NOT_FOUND => Err(RemoteError::NotFound(*cid)),
                status => Err(RemoteError::UnexpectedStatus {
                    cid: *cid,
                    status: status.as_u16(),
                }),
            }
        })
        .await?
    }

    async fn has(&self, ctx: &Context, cid: &Cid) -> RemoteResult<bool> {
        let found = ctx.run(self.head(cid)).await??;
        Ok(found.is_some())
    }

    async fn get_size(&self, ctx: &Context, cid: &Cid) -> RemoteResult<u64> {
        match ctx.run(self.head(cid)).await?? {
            Some(resp) => block_size(&resp).ok_or_else(|| {
                RemoteError::TransportError(format!("missing block size for {cid}"))
            }),
            None => Err(RemoteError::NotFound(*cid)),
        }
    }
}
