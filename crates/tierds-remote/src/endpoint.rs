/// HTTP endpoint paths of the block API.
pub mod endpoints {
    /// `GET` returns the block bytes, `HEAD` its size. Followed by `/{cid}`.
    pub const BLOCK: &str = "/v1/block";
    pub const HEALTH: &str = "/v1/health";
}

/// Response header carrying a block's size on `HEAD` requests.
pub const BLOCK_SIZE_HEADER: &str = "x-block-size";

/// Health check response.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}
