use async_trait::async_trait;
use tierds_store::{Datastore, StoreError};
use tierds_types::{cid_to_key, Cid, Context};

use crate::error::{RemoteError, RemoteResult};
use crate::traits::BlockStore;

/// Serves a key-addressed [`Datastore`] as a [`BlockStore`].
///
/// Blocks are looked up under their multihash key, so every codec variant of
/// a CID resolves to the same stored value.
#[derive(Debug)]
pub struct DatastoreBlockStore<D> {
    inner: D,
}

impl<D: Datastore> DatastoreBlockStore<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

fn from_store(cid: &Cid, err: StoreError) -> RemoteError {
    match err {
        StoreError::NotFound(_) => RemoteError::NotFound(*cid),
        StoreError::Interrupted(reason) => RemoteError::Interrupted(reason),
        other => RemoteError::Backend(other.to_string()),
    }
}

#[async_trait]
impl<D: Datastore> BlockStore for DatastoreBlockStore<D> {
    async fn get(&self, ctx: &Context, cid: &Cid) -> RemoteResult<Vec<u8>> {
        self.inner
            .get(ctx, &cid_to_key(cid))
            .await
            .map_err(|e| from_store(cid, e))
    }

    async fn has(&self, ctx: &Context, cid: &Cid) -> RemoteResult<bool> {
        self.inner
            .has(ctx, &cid_to_key(cid))
            .await
            .map_err(|e| from_store(cid, e))
    }

    async fn get_size(&self, ctx: &Context, cid: &Cid) -> RemoteResult<u64> {
        self.inner
            .get_size(ctx, &cid_to_key(cid))
            .await
            .map_err(|e| from_store(cid, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierds_store::{FlatfsDatastore, InMemoryDatastore, ShardFunction};
    use tierds_types::{block_cid, Codec};

    #[tokio::test]
    async fn every_codec_resolves_to_the_stored_value() {
        let ctx = Context::background();
        let raw = block_cid(Codec::RAW, b"block");
        let pb = block_cid(Codec::DAG_PROTOBUF, b"block");
        let store = InMemoryDatastore::new();
        store.put(&ctx, &cid_to_key(&raw), b"block").await.unwrap();

        let blocks = DatastoreBlockStore::new(store);
        assert_eq!(blocks.get(&ctx, &raw).await.unwrap(), b"block");
        assert_eq!(blocks.get(&ctx, &pb).await.unwrap(), b"block");
        assert_eq!(blocks.get_size(&ctx, &pb).await.unwrap(), 5);
        assert!(blocks.has(&ctx, &pb).await.unwrap());
    }

    #[tokio::test]
    async fn miss_maps_to_not_found() {
        let ctx = Context::background();
        let blocks = DatastoreBlockStore::new(InMemoryDatastore::new());
        let cid = block_cid(Codec::RAW, b"absent");
        let err = blocks.get(&ctx, &cid).await.unwrap_err();
        assert!(matches!(err, RemoteError::NotFound(c) if c == cid));
        assert!(!blocks.has(&ctx, &cid).await.unwrap());
    }

    #[tokio::test]
    async fn serves_a_flatfs_directory() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::background();
        let flatfs = FlatfsDatastore::create_or_open(dir.path(), ShardFunction::default(), false).unwrap();
        let cid = block_cid(Codec::RAW, b"on disk");
        flatfs.put(&ctx, &cid_to_key(&cid), b"on disk").await.unwrap();

        let blocks = DatastoreBlockStore::new(flatfs);
        assert_eq!(blocks.get(&ctx, &cid).await.unwrap(), b"on disk");
    }
}
