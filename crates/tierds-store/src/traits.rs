use std::sync::Arc;

use async_trait::async_trait;
use tierds_types::{Context, DatastoreKey};

use crate::error::StoreResult;

/// Key/value datastore addressed by [`DatastoreKey`].
///
/// All implementations must satisfy these invariants:
/// - Every call honours `ctx`: a cancelled or expired context ends the call
///   with [`StoreError::Interrupted`](crate::StoreError::Interrupted).
/// - Reads of a missing key fail with [`StoreError::NotFound`](crate::StoreError::NotFound),
///   except `has`, which returns `Ok(false)`.
/// - Concurrent calls through `&self` are safe.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<Vec<u8>>;

    /// Check whether a value is stored under `key`.
    async fn has(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<bool>;

    /// Size in bytes of the value stored under `key`.
    async fn get_size(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<u64>;

    /// Store `value` under `key`, replacing any previous value.
    async fn put(&self, ctx: &Context, key: &DatastoreKey, value: &[u8]) -> StoreResult<()>;

    /// Remove the value under `key`. Removing a missing key is not an error.
    async fn delete(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<()>;
}

#[async_trait]
impl<T: Datastore + ?Sized> Datastore for Arc<T> {
    async fn get(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<Vec<u8>> {
        (**self).get(ctx, key).await
    }

    async fn has(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<bool> {
        (**self).has(ctx, key).await
    }

    async fn get_size(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<u64> {
        (**self).get_size(ctx, key).await
    }

    async fn put(&self, ctx: &Context, key: &DatastoreKey, value: &[u8]) -> StoreResult<()> {
        (**self).put(ctx, key, value).await
    }

    async fn delete(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<()> {
        (**self).delete(ctx, key).await
    }
}
