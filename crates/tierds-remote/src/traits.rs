use std::sync::Arc;

use async_trait::async_trait;
use tierds_types::{Cid, Context};

use crate::error::RemoteResult;

/// Read-only, CID-addressed block store.
///
/// A miss is [`RemoteError::NotFound`](crate::RemoteError::NotFound) for `get`
/// and `get_size`, and `Ok(false)` for `has`. Implementations must stop with
/// [`RemoteError::Interrupted`](crate::RemoteError::Interrupted) when `ctx`
/// ends, and must be safe to share between concurrent callers.
#[async_trait]
pub trait BlockStore: Send + Sync {
    async fn get(&self, ctx: &Context, cid: &Cid) -> RemoteResult<Vec<u8>>;
    async fn has(&self, ctx: &Context, cid: &Cid) -> RemoteResult<bool>;
    async fn get_size(&self, ctx: &Context, cid: &Cid) -> RemoteResult<u64>;
}

#[async_trait]
impl<T: BlockStore + ?Sized> BlockStore for Arc<T> {
    async fn get(&self, ctx: &Context, cid: &Cid) -> RemoteResult<Vec<u8>> {
        (**self).get(ctx, cid).await
    }

    async fn has(&self, ctx: &Context, cid: &Cid) -> RemoteResult<bool> {
        (**self).has(ctx, cid).await
    }

    async fn get_size(&self, ctx: &Context, cid: &Cid) -> RemoteResult<u64> {
        (**self).get_size(ctx, cid).await
    }
}
